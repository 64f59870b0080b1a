use std::collections::BinaryHeap;

use glam::Vec3;
use lightbuilder_models::BoundingBox;

use super::*;

/// Nodes holding at most this many photons always become leaves.
const LEAF_SIZE: usize = 10;

/// Spatial tree over photon positions, split at the box midpoint along a
/// round-robin axis.
///
/// Nodes live in a single arena and refer to their children by index; only
/// the leaves hold photons.
#[derive(Clone, Debug)]
pub struct PhotonTree {
    nodes: Vec<PhotonNode>,
    len: usize,
}

#[derive(Clone, Debug)]
pub struct PhotonNode {
    pub bounds: BoundingBox,
    pub items: Vec<Photon>,
    pub left: Option<u32>,
    pub right: Option<u32>,
}

impl PhotonTree {
    pub fn build(photons: Vec<Photon>, max_depth: u32) -> Self {
        let mut this = Self {
            nodes: Vec::new(),
            len: photons.len(),
        };

        this.add(photons, 0, max_depth);
        this
    }

    fn add(&mut self, photons: Vec<Photon>, depth: u32, max_depth: u32) -> u32 {
        let id = self.nodes.len() as u32;
        let bounds: BoundingBox = photons.iter().map(|p| p.position).collect();

        if depth >= max_depth || photons.len() <= LEAF_SIZE {
            self.nodes.push(PhotonNode {
                bounds,
                items: photons,
                left: None,
                right: None,
            });

            return id;
        }

        self.nodes.push(PhotonNode {
            bounds,
            items: Vec::new(),
            left: None,
            right: None,
        });

        let axis = depth as usize % 3;
        let split = bounds.center()[axis];

        let (left, right): (Vec<_>, Vec<_>) = photons
            .into_iter()
            .partition(|photon| photon.position[axis] < split);

        let left =
            (!left.is_empty()).then(|| self.add(left, depth + 1, max_depth));

        let right =
            (!right.is_empty()).then(|| self.add(right, depth + 1, max_depth));

        let node = &mut self.nodes[id as usize];

        node.left = left;
        node.right = right;

        id
    }

    pub fn nodes(&self) -> &[PhotonNode] {
        &self.nodes
    }

    /// Returns number of photons stored in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Calls `f` for each photon lying closer than `radius` to `point`,
    /// passing the photon's squared distance along.
    pub fn for_each_within(
        &self,
        point: Vec3,
        radius: f32,
        mut f: impl FnMut(&Photon, f32),
    ) {
        let radius_squared = radius * radius;
        let mut stack = vec![0];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id as usize) else {
                continue;
            };

            if !node.bounds.intersects_sphere(point, radius) {
                continue;
            }

            for photon in &node.items {
                let distance_squared = photon.position.distance_squared(point);

                if distance_squared < radius_squared {
                    f(photon, distance_squared);
                }
            }

            stack.extend(node.right);
            stack.extend(node.left);
        }
    }

    /// Returns up to `count` photons nearest to `point`, closest first;
    /// photons further than `radius` away are never considered.
    pub fn nearest(
        &self,
        point: Vec3,
        radius: f32,
        count: usize,
    ) -> Vec<PhotonCandidate> {
        if count == 0 {
            return Vec::new();
        }

        let radius_squared = radius * radius;
        let mut heap = BinaryHeap::with_capacity(count + 1);
        let mut stack = vec![0];

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id as usize) else {
                continue;
            };

            let distance_squared = node.bounds.distance_squared(point);

            if distance_squared == f32::MAX
                || distance_squared >= radius_squared
            {
                continue;
            }

            let is_too_far = heap.len() == count
                && heap.peek().is_some_and(|worst: &PhotonCandidate| {
                    distance_squared >= worst.distance_squared
                });

            if is_too_far {
                continue;
            }

            for photon in &node.items {
                let distance_squared = photon.position.distance_squared(point);

                if distance_squared >= radius_squared {
                    continue;
                }

                heap.push(PhotonCandidate {
                    photon,
                    distance_squared,
                });

                if heap.len() > count {
                    heap.pop();
                }
            }

            // Visit the closer child first, so that the heap fills up with
            // good candidates early
            let children = [node.left, node.right];

            let mut children: Vec<_> = children
                .into_iter()
                .flatten()
                .map(|id| {
                    let bounds = &self.nodes[id as usize].bounds;

                    (id, bounds.distance_squared(point))
                })
                .collect();

            children.sort_by(|a, b| b.1.total_cmp(&a.1));
            stack.extend(children.into_iter().map(|(id, _)| id));
        }

        heap.into_sorted_vec()
    }
}
