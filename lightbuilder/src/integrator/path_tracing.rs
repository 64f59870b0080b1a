use glam::Vec3;
use lightbuilder_models::{Noise, Vec3Ext};

use super::*;

impl Integrator<'_> {
    /// Picks a single continuation (glass, mirror or diffuse) with one
    /// uniform draw.
    ///
    /// Continuations are chosen with probability equal to their share of
    /// the energy, so the chosen ray carries the full throughput.
    pub(super) fn path_trace(
        &mut self,
        vertex: &PathVertex,
        surface: &Surface,
        noise: &mut Noise,
    ) -> Vec3 {
        let material = surface.material;
        let interface = surface.interface(vertex.ray.direction());
        let normal = interface.normal;
        let point = surface.point;

        let refract = material.refraction() * (1.0 - interface.fresnel);
        let reflect = material.reflection() * interface.fresnel;
        let r = noise.sample();

        if r < refract {
            let ray = vertex
                .ray
                .refract(normal, point, interface.eta)
                .unwrap_or_else(|| vertex.ray.reflect(normal, point));

            self.stack.push(vertex.refracted(ray, vertex.power));

            return Vec3::ZERO;
        }

        if r < refract + reflect {
            let ray = vertex.ray.reflect(normal, point);

            self.stack.push(vertex.reflected(ray, vertex.power));

            return Vec3::ZERO;
        }

        let emissive = material.emissive();

        // Emissive surfaces act as lights and end the path
        if !emissive.is_black() {
            return emissive * vertex.power;
        }

        let ray = vertex.ray.diffuse(normal, point, noise);

        self.stack
            .push(vertex.scattered(ray, vertex.power * material.diffuse()));

        Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use glam::{vec3, Affine3A};

    use super::super::tests::*;
    use super::*;
    use crate::{
        Actor, BakeSettings, CollectKind, Light, Lod, Material, Mesh,
        MeshRender, Scene,
    };

    fn settings(second: CollectKind, bounces: u32) -> BakeSettings {
        BakeSettings::default()
            .with_bounce_engines(CollectKind::PathTracing, second)
            .with_path_tracing(1, bounces)
    }

    #[test]
    fn emissive_ends_path() {
        let fixture = Fixture::new(Scene::new().with_actor(quad(
            0.0,
            Material::default().with_emissive(vec3(3.0, 2.0, 1.0)),
        )));

        let settings = settings(CollectKind::PathTracing, 4);
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_eq!(vec3(3.0, 2.0, 1.0), radiance);
    }

    #[test]
    fn diffuse_bounce_into_emitter() {
        // Floor below, a huge emissive ceiling above it
        let ceiling = Actor::new("ceiling")
            .with_transform(
                Affine3A::from_translation(vec3(0.0, 0.0, 1.0))
                    * Affine3A::from_scale(Vec3::splat(1000.0)),
            )
            .with_component(
                MeshRender::new(Arc::new(
                    Mesh::default().with_lod(Lod::quad()),
                ))
                .with_material(
                    Material::default()
                        .with_diffuse(Vec3::ZERO)
                        .with_emissive(Vec3::ONE),
                ),
            );

        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(
                    0.0,
                    Material::default().with_diffuse(Vec3::splat(0.5)),
                ))
                .with_actor(ceiling),
        );

        let settings = settings(CollectKind::PathTracing, 1);
        let mut integrator = fixture.integrator(&settings);
        let mut noise = Noise::new(1);

        for _ in 0..16 {
            let radiance = integrator.radiance(down(0.5), &mut noise);

            assert_relative_eq!(radiance.x, 0.5);
        }
    }

    #[test]
    fn bounce_limit() {
        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, Material::default()))
                .with_actor(
                    Actor::new("sky").with_component(Light::ambient(Vec3::ONE)),
                ),
        );

        // With no bounces left, the diffuse continuation is dropped
        let settings = settings(CollectKind::BackTracing, 0);
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_eq!(Vec3::ZERO, radiance);
    }

    #[test]
    fn second_bounce_back_traces() {
        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, Material::default()))
                .with_actor(quad(
                    1.0,
                    Material::default().with_diffuse(Vec3::splat(0.5)),
                )),
        );

        let settings = settings(CollectKind::BackTracing, 1)
            .with_ambient(Vec3::ONE);

        let mut integrator = fixture.integrator(&settings);
        let mut noise = Noise::new(3);
        let mut hits = 0;

        for _ in 0..64 {
            let radiance = integrator.radiance(down(0.5), &mut noise);

            // Either the bounce escaped past the upper quad (black) or it
            // got lit by the ambient term
            if radiance.x > 0.0 {
                assert_relative_eq!(radiance.x, 0.5);
                hits += 1;
            }
        }

        assert!(hits > 0);
    }
}
