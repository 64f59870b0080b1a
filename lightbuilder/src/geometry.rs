use glam::{Vec2, Vec3};
use lightbuilder_models::{fresnel, BoundingBox, TRACER_EPSILON};

use crate::{Light, Material};

/// Flattened scene: world-space vertex buffers plus the triangles, instances
/// and lights referencing them.
///
/// Built once per bake by [`crate::GeometryCollector`] and read-only
/// afterwards.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    triangles: Vec<Triangle>,
    instances: Vec<InstanceInfo>,
    lights: Vec<Light>,
}

impl Geometry {
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn instances(&self) -> &[InstanceInfo] {
        &self.instances
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.positions.iter().copied().collect()
    }

    pub fn material(&self, instance: InstanceId) -> Material {
        self.instances
            .get(instance.get() as usize)
            .map(|instance| instance.material)
            .unwrap_or_default()
    }

    /// Returns triangle's vertices in given space; UV-space vertices lie on
    /// the z = 0 plane.
    pub fn points(&self, triangle: &Triangle, space: Space) -> [Vec3; 3] {
        triangle.indices.map(|idx| match space {
            Space::World => self.positions[idx as usize],
            Space::Uv => self.uvs[idx as usize].extend(0.0),
        })
    }

    pub(crate) fn uv_points(&self, triangle: &Triangle) -> [Vec2; 3] {
        triangle.indices.map(|idx| self.uvs[idx as usize])
    }

    /// Interpolates surface attributes at a point given by its barycentric
    /// `weights` within `triangle`.
    pub fn surface(&self, triangle: &Triangle, weights: Vec3) -> Surface {
        let [a, b, c] = self.points(triangle, Space::World);
        let [na, nb, nc] =
            triangle.indices.map(|idx| self.normals[idx as usize]);

        let point = a * weights.x + b * weights.y + c * weights.z;
        let face_normal = (b - a).cross(c - a).normalize_or_zero();

        let normal = (na * weights.x + nb * weights.y + nc * weights.z)
            .normalize_or_zero();

        let normal = if normal.length_squared() < TRACER_EPSILON {
            face_normal
        } else {
            normal
        };

        Surface {
            point,
            normal,
            material: self.material(triangle.instance),
        }
    }

    pub(crate) fn push_instance(
        &mut self,
        name: &str,
        material: Material,
    ) -> InstanceId {
        let id = InstanceId::new(self.instances.len() as u32);

        self.instances.push(InstanceInfo {
            name: name.to_owned(),
            material,
        });

        id
    }

    pub(crate) fn push_vertex(
        &mut self,
        position: Vec3,
        normal: Vec3,
        uv: Vec2,
    ) {
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
    }

    pub(crate) fn push_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub(crate) fn push_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    World,

    /// Lightmap space, where each vertex is placed at its UV coordinates.
    Uv,
}

impl Space {
    pub(crate) fn dimensions(self) -> usize {
        match self {
            Space::World => 3,
            Space::Uv => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstanceId(u32);

impl InstanceId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct InstanceInfo {
    pub name: String,
    pub material: Material,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub instance: InstanceId,
}

/// Surface attributes at a ray hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub point: Vec3,
    pub normal: Vec3,
    pub material: Material,
}

impl Surface {
    /// Describes how a ray travelling along `direction` crosses this
    /// surface.
    pub fn interface(&self, direction: Vec3) -> Interface {
        let inside = direction.dot(self.normal) > 0.0;
        let normal = if inside { -self.normal } else { self.normal };
        let ior = self.material.ior().max(TRACER_EPSILON);
        let eta = if inside { ior } else { 1.0 / ior };

        let fresnel = if self.material.refraction() > 0.0 {
            fresnel(-direction.dot(normal), eta)
        } else {
            1.0
        };

        Interface {
            normal,
            inside,
            eta,
            fresnel,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interface {
    /// Normal facing the incoming ray.
    pub normal: Vec3,

    /// Whether the ray arrives from within the object.
    pub inside: bool,

    /// Ratio of indices of refraction (incoming over outgoing).
    pub eta: f32,

    /// Share of energy that gets reflected; `1.0` for opaque surfaces.
    pub fresnel: f32,
}
