mod bvh_builder;
mod bvh_node;

use std::fmt;

use glam::{Vec2, Vec3};
use lightbuilder_models::{hit_triangle, locate_in_triangle, Ray};

pub use self::bvh_builder::*;
pub use self::bvh_node::*;
use crate::{Geometry, Space, Triangle};

/// Flattened bounding volume hierarchy over a list of triangles.
///
/// Traversal follows the ropes stored in the nodes, so it needs neither a
/// stack nor any allocations.
#[derive(Clone, Debug)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
    space: Space,
}

impl Bvh {
    pub(crate) fn new(
        nodes: Vec<BvhNode>,
        triangles: Vec<Triangle>,
        space: Space,
    ) -> Self {
        Self {
            nodes,
            triangles,
            space,
        }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Returns triangles, ordered so that each node's range is contiguous.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn space(&self) -> Space {
        self.space
    }

    /// Traces this ray and returns its nearest hit.
    pub fn trace_nearest(&self, geometry: &Geometry, ray: &Ray) -> Option<Hit> {
        let mut hit = Hit::none();

        self.trace(geometry, ray, TracingMode::Nearest, &mut hit);

        hit.triangle.map(|_| hit)
    }

    /// Traces this ray and returns whether it hits anything up to the given
    /// distance.
    pub fn trace_any(
        &self,
        geometry: &Geometry,
        ray: &Ray,
        max_distance: f32,
    ) -> bool {
        let mut hit = Hit {
            distance: max_distance,
            ..Hit::none()
        };

        self.trace(geometry, ray, TracingMode::Any, &mut hit);

        hit.triangle.is_some()
    }

    fn trace(
        &self,
        geometry: &Geometry,
        ray: &Ray,
        mode: TracingMode,
        hit: &mut Hit,
    ) {
        if ray.is_degenerate() {
            return;
        }

        let mut next = self.root();

        while let Some(id) = next {
            let node = &self.nodes[id.get() as usize];

            if !ray.hits_box(&node.bounds, hit.distance) {
                next = node.escape;
                continue;
            }

            for triangle in &self.triangles[node.triangles()] {
                let points = geometry.points(triangle, self.space);

                if let Some(tri_hit) = hit_triangle(ray, points, hit.distance) {
                    hit.distance = tri_hit.distance;
                    hit.weights = tri_hit.weights();
                    hit.triangle = Some(*triangle);

                    if let TracingMode::Any = mode {
                        return;
                    }
                }
            }

            next = node.left.or(node.escape);
        }
    }

    /// Finds triangle covering given lightmap coordinates, returning it
    /// together with the point's barycentric weights.
    pub fn locate(
        &self,
        geometry: &Geometry,
        uv: Vec2,
    ) -> Option<(Triangle, Vec3)> {
        let point = uv.extend(0.0);
        let mut next = self.root();

        while let Some(id) = next {
            let node = &self.nodes[id.get() as usize];

            if !node.bounds.contains(point, 0.0) {
                next = node.escape;
                continue;
            }

            for triangle in &self.triangles[node.triangles()] {
                let points = geometry.uv_points(triangle);

                if let Some(weights) = locate_in_triangle(uv, points) {
                    return Some((*triangle, weights));
                }
            }

            next = node.left.or(node.escape);
        }

        None
    }

    fn root(&self) -> Option<BvhNodeId> {
        (!self.nodes.is_empty()).then(|| BvhNodeId::new(0))
    }
}

impl fmt::Display for Bvh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node_id, node) in self.nodes.iter().enumerate() {
            writeln!(f, "[{}]: {}", node_id, node)?;
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub triangle: Option<Triangle>,
    pub distance: f32,
    pub weights: Vec3,
}

impl Hit {
    pub fn none() -> Self {
        Self {
            triangle: None,
            distance: f32::MAX,
            weights: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TracingMode {
    Nearest,
    Any,
}
