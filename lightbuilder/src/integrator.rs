mod back_tracing;
mod path_tracing;
mod photon_mapping;

use glam::Vec3;
use lightbuilder_models::{Noise, Ray, Vec3Ext};

use crate::{
    BakeSettings, Bvh, CollectKind, Geometry, LightKind, PhotonTree, Surface,
};

/// Paths whose throughput drops below this (in any channel) are abandoned.
pub const MIN_POWER: f32 = 0.001;

pub const MAX_REFLECTIONS: u32 = 10;
pub const MAX_REFRACTIONS: u32 = 10;

/// Evaluates radiance arriving along rays, using the light-transport
/// algorithms selected in [`BakeSettings`].
///
/// Secondary rays are kept on an explicit stack which is reused between
/// calls, so a worker allocates it only once.
pub struct Integrator<'a> {
    geometry: &'a Geometry,
    bvh: &'a Bvh,
    photons: Option<&'a PhotonTree>,
    settings: &'a BakeSettings,
    ambient: Vec3,
    max_diffuse_bounces: u32,
    stack: Vec<PathVertex>,
}

impl<'a> Integrator<'a> {
    pub fn new(
        geometry: &'a Geometry,
        bvh: &'a Bvh,
        photons: Option<&'a PhotonTree>,
        settings: &'a BakeSettings,
    ) -> Self {
        let ambient = geometry
            .lights()
            .iter()
            .filter(|light| light.kind() == LightKind::Ambient)
            .fold(settings.ambient(), |ambient, light| {
                ambient + light.power()
            });

        Self {
            geometry,
            bvh,
            photons,
            settings,
            ambient,
            max_diffuse_bounces: settings.max_diffuse_bounces(),
            stack: Vec::with_capacity(32),
        }
    }

    /// Returns radiance arriving along given ray.
    pub fn radiance(&mut self, ray: Ray, noise: &mut Noise) -> Vec3 {
        self.stack.clear();
        self.stack.push(PathVertex::primary(ray, None));
        self.run(noise)
    }

    /// Returns radiance leaving given surface towards its normal; used when
    /// baking lightmaps, where the primary hit is already known.
    pub fn radiance_at(&mut self, surface: Surface, noise: &mut Noise) -> Vec3 {
        let ray = Ray::new(surface.point + surface.normal, -surface.normal);

        self.stack.clear();
        self.stack.push(PathVertex::primary(ray, Some(surface)));
        self.run(noise)
    }

    fn run(&mut self, noise: &mut Noise) -> Vec3 {
        let mut result = Vec3::ZERO;

        while let Some(vertex) = self.stack.pop() {
            if vertex.power.any_below(MIN_POWER)
                || vertex.diffuse > self.max_diffuse_bounces
                || vertex.reflections >= MAX_REFLECTIONS
                || vertex.refractions >= MAX_REFRACTIONS
            {
                continue;
            }

            let surface = vertex.surface.or_else(|| self.hit(&vertex.ray));

            let Some(surface) = surface else {
                continue;
            };

            let mode = if vertex.diffuse == 0 {
                self.settings.first_bounce()
            } else {
                self.settings.second_bounce()
            };

            result += match mode {
                CollectKind::BackTracing => self.back_trace(&vertex, &surface),
                CollectKind::PhotonMapping => {
                    self.photon_map(&vertex, &surface)
                }
                CollectKind::PathTracing => {
                    self.path_trace(&vertex, &surface, noise)
                }
            };
        }

        if result.is_finite() {
            result
        } else {
            Vec3::ZERO
        }
    }

    fn hit(&self, ray: &Ray) -> Option<Surface> {
        let hit = self.bvh.trace_nearest(self.geometry, ray)?;
        let triangle = hit.triangle?;

        Some(self.geometry.surface(&triangle, hit.weights))
    }
}

/// Pending ray on the integrator's stack.
#[derive(Clone, Copy, Debug)]
struct PathVertex {
    ray: Ray,

    /// Surface this ray is known to hit; `None` means it has to be traced.
    surface: Option<Surface>,

    diffuse: u32,
    reflections: u32,
    refractions: u32,
    power: Vec3,
}

impl PathVertex {
    fn primary(ray: Ray, surface: Option<Surface>) -> Self {
        Self {
            ray,
            surface,
            diffuse: 0,
            reflections: 0,
            refractions: 0,
            power: Vec3::ONE,
        }
    }

    fn reflected(&self, ray: Ray, power: Vec3) -> Self {
        Self {
            ray,
            surface: None,
            reflections: self.reflections + 1,
            power,
            ..*self
        }
    }

    fn refracted(&self, ray: Ray, power: Vec3) -> Self {
        Self {
            ray,
            surface: None,
            refractions: self.refractions + 1,
            power,
            ..*self
        }
    }

    fn scattered(&self, ray: Ray, power: Vec3) -> Self {
        Self {
            ray,
            surface: None,
            diffuse: self.diffuse + 1,
            power,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use glam::{vec3, Affine3A, Quat};

    use super::*;
    use crate::{
        Actor, BvhBuilder, GeometryCollector, Light, Lod, Material, Mesh,
        MeshRender, Scene, Space,
    };

    pub(super) struct Fixture {
        pub geometry: Geometry,
        pub bvh: Bvh,
    }

    impl Fixture {
        pub fn new(scene: Scene) -> Self {
            let geometry = GeometryCollector::collect(&scene).unwrap();

            let bvh = BvhBuilder::build(
                geometry.triangles().to_vec(),
                &geometry,
                Space::World,
            );

            Self { geometry, bvh }
        }

        pub fn integrator<'a>(
            &'a self,
            settings: &'a BakeSettings,
        ) -> Integrator<'a> {
            Integrator::new(&self.geometry, &self.bvh, None, settings)
        }
    }

    /// Returns actor with a unit quad at given height, facing +Z.
    pub(super) fn quad(z: f32, material: Material) -> Actor {
        let mesh = Arc::new(Mesh::default().with_lod(Lod::quad()));

        Actor::new("quad")
            .with_transform(Affine3A::from_translation(vec3(0.0, 0.0, z)))
            .with_component(MeshRender::new(mesh).with_material(material))
    }

    pub(super) fn down(z: f32) -> Ray {
        Ray::new(vec3(0.1, 0.1, z), Vec3::NEG_Z)
    }

    #[test]
    fn miss_is_black() {
        let fixture = Fixture::new(Scene::new());
        let settings = BakeSettings::default();
        let mut integrator = fixture.integrator(&settings);

        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_eq!(Vec3::ZERO, radiance);
    }

    #[test]
    fn ambient_lights_add_up() {
        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, Material::default()))
                .with_actor(
                    Actor::new("sky")
                        .with_component(Light::ambient(Vec3::splat(0.25))),
                ),
        );

        let settings = BakeSettings::default().with_ambient(Vec3::splat(0.5));
        let mut integrator = fixture.integrator(&settings);

        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_eq!(Vec3::splat(0.75), radiance);
    }

    #[test]
    fn uv_start() {
        let fixture = Fixture::new(
            Scene::new().with_actor(quad(
                0.0,
                Material::default().with_diffuse(vec3(1.0, 0.5, 0.25)),
            )),
        );

        let settings = BakeSettings::default().with_ambient(Vec3::ONE);
        let mut integrator = fixture.integrator(&settings);
        let triangle = fixture.geometry.triangles()[0];

        let surface = fixture
            .geometry
            .surface(&triangle, Vec3::splat(1.0 / 3.0));

        let radiance = integrator.radiance_at(surface, &mut Noise::new(0));

        assert_relative_eq!(radiance.x, 1.0);
        assert_relative_eq!(radiance.y, 0.5);
        assert_relative_eq!(radiance.z, 0.25);
    }

    #[test]
    fn tilted_quad_is_hit() {
        let mesh = Arc::new(Mesh::default().with_lod(Lod::quad()));

        let fixture = Fixture::new(
            Scene::new().with_actor(
                Actor::new("tilted")
                    .with_transform(Affine3A::from_quat(Quat::from_rotation_x(
                        0.3,
                    )))
                    .with_component(MeshRender::new(mesh)),
            ),
        );

        let settings = BakeSettings::default();
        let mut integrator = fixture.integrator(&settings);

        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_relative_eq!(radiance.x, 0.2);
    }
}
