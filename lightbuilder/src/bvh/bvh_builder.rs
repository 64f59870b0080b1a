use std::ops::Range;

use lightbuilder_models::BoundingBox;

use super::*;
use crate::{Geometry, Space, Triangle};

/// Nodes deeper than this always become leaves.
pub const MAX_DEPTH: u32 = 33;

/// Nodes holding at most this many triangles always become leaves.
pub const LEAF_SIZE: usize = 10;

/// Builds a roped BVH using midpoint splits along a round-robin axis.
///
/// Triangles are reordered in place, so that each node's triangles form a
/// contiguous range of the final triangle list.
pub struct BvhBuilder<'a> {
    geometry: &'a Geometry,
    space: Space,
    triangles: Vec<Triangle>,
    nodes: Vec<BvhNode>,
}

impl<'a> BvhBuilder<'a> {
    pub fn build(
        triangles: Vec<Triangle>,
        geometry: &'a Geometry,
        space: Space,
    ) -> Bvh {
        let mut this = Self {
            geometry,
            space,
            nodes: Vec::with_capacity(triangles.len() / LEAF_SIZE * 2 + 1),
            triangles,
        };

        this.add(0..this.triangles.len(), 0, None);

        Bvh::new(this.nodes, this.triangles, space)
    }

    fn add(
        &mut self,
        range: Range<usize>,
        depth: u32,
        escape: Option<BvhNodeId>,
    ) -> BvhNodeId {
        let id = BvhNodeId::new(self.nodes.len() as u32);
        let bounds = self.bounds(range.clone());

        self.nodes.push(BvhNode {
            bounds,
            offset: range.start as u32,
            count: range.len() as u32,
            left: None,
            escape,
        });

        if depth >= MAX_DEPTH || range.len() <= LEAF_SIZE {
            return id;
        }

        let axis = depth as usize % self.space.dimensions();
        let split = bounds.center()[axis];
        let (left, right, rest) = self.partition(range, axis, split);

        if left.is_empty() && right.is_empty() {
            return id;
        }

        // Right subtree goes first, so that the left one knows where to escape
        let right_id =
            (!right.is_empty()).then(|| self.add(right, depth + 1, escape));

        let left_id = (!left.is_empty())
            .then(|| self.add(left, depth + 1, right_id.or(escape)));

        let node = &mut self.nodes[id.get() as usize];

        node.offset = rest.start as u32;
        node.count = rest.len() as u32;
        node.left = left_id.or(right_id);

        id
    }

    /// Reorders triangles within `range` into three consecutive groups:
    /// those fully below `split`, those fully above it and those crossing it.
    fn partition(
        &mut self,
        range: Range<usize>,
        axis: usize,
        split: f32,
    ) -> (Range<usize>, Range<usize>, Range<usize>) {
        let side = |triangle: &Triangle| -> Side {
            let points = self.geometry.points(triangle, self.space);

            if points.iter().all(|p| p[axis] < split) {
                Side::Left
            } else if points.iter().all(|p| p[axis] >= split) {
                Side::Right
            } else {
                Side::Both
            }
        };

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut rest = Vec::new();

        for triangle in &self.triangles[range.clone()] {
            match side(triangle) {
                Side::Left => left.push(*triangle),
                Side::Right => right.push(*triangle),
                Side::Both => rest.push(*triangle),
            }
        }

        let left_end = range.start + left.len();
        let right_end = left_end + right.len();

        for (dst, src) in self.triangles[range.clone()]
            .iter_mut()
            .zip(left.into_iter().chain(right).chain(rest))
        {
            *dst = src;
        }

        (
            range.start..left_end,
            left_end..right_end,
            right_end..range.end,
        )
    }

    fn bounds(&self, range: Range<usize>) -> BoundingBox {
        let bounds: BoundingBox = self.triangles[range]
            .iter()
            .flat_map(|triangle| self.geometry.points(triangle, self.space))
            .collect();

        match self.space {
            Space::World => bounds,

            // Flat boxes are hard to hit, so UV-space boxes get some depth
            Space::Uv if bounds.is_set() => BoundingBox::new(
                bounds.min().truncate().extend(-0.5),
                bounds.max().truncate().extend(0.5),
            ),

            Space::Uv => bounds,
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Both,
}
