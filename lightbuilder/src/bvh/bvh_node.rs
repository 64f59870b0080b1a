use std::fmt;

use lightbuilder_models::BoundingBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BvhNodeId(u32);

impl BvhNodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BvhNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node of a flattened, roped BVH.
///
/// Nodes are stored in pre-order: a node's first child immediately follows
/// it, and `escape` points at the node where traversal should continue once
/// this node's subtree has been either missed or exhausted (`None` means the
/// traversal is over).
///
/// Triangles which straddle the node's split plane stay in the node itself,
/// so interior nodes can own triangles as well.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BvhNode {
    pub bounds: BoundingBox,
    pub offset: u32,
    pub count: u32,
    pub left: Option<BvhNodeId>,
    pub escape: Option<BvhNodeId>,
}

impl BvhNode {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }

    /// Returns range of triangles owned by this node.
    pub fn triangles(&self) -> std::ops::Range<usize> {
        let offset = self.offset as usize;

        offset..(offset + self.count as usize)
    }
}

impl fmt::Display for BvhNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aabb {}..{}, triangles {}+{}",
            self.bounds.min(),
            self.bounds.max(),
            self.offset,
            self.count
        )?;

        if let Some(id) = self.left {
            write!(f, ", on-hit-goto {}", id)?;
        }

        if let Some(id) = self.escape {
            write!(f, ", on-miss-goto {}", id)?;
        }

        Ok(())
    }
}
