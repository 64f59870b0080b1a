use glam::Vec3;
use lightbuilder_models::Ray;

use super::*;

impl Integrator<'_> {
    /// Direct lighting at the surface, plus mirror and glass continuations
    /// pushed onto the stack with their share of the energy.
    pub(super) fn back_trace(
        &mut self,
        vertex: &PathVertex,
        surface: &Surface,
    ) -> Vec3 {
        let material = surface.material;
        let interface = surface.interface(vertex.ray.direction());
        let c = interface.fresnel;
        let point = surface.point;

        if material.refraction() > 0.0 {
            let power = vertex.power * material.refraction() * (1.0 - c);

            let ray = vertex
                .ray
                .refract(interface.normal, point, interface.eta)
                .unwrap_or_else(|| vertex.ray.reflect(interface.normal, point));

            self.stack.push(vertex.refracted(ray, power));
        }

        if material.reflection() > 0.0 {
            let power = vertex.power * material.reflection() * c;
            let ray = vertex.ray.reflect(interface.normal, point);

            self.stack.push(vertex.reflected(ray, power));
        }

        let specular = mix(material.refraction(), material.reflection(), c);
        let f = material.diffuse() * (1.0 - specular);
        let direct = self.direct(point, interface.normal);

        (direct * f + material.emissive()) * vertex.power
    }

    /// Light reaching given point directly: the ambient term plus every
    /// light that isn't occluded.
    pub(super) fn direct(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let origin = point + normal * Ray::NUDGE_OFFSET;

        self.geometry
            .lights()
            .iter()
            .filter_map(|light| light.illuminate(point, normal))
            .filter(|ill| {
                let shadow = Ray::new(origin, ill.direction);
                let max_distance = ill.distance - Ray::NUDGE_OFFSET;

                !self.bvh.trace_any(self.geometry, &shadow, max_distance)
            })
            .fold(self.ambient, |light, ill| light + ill.radiance)
    }
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;
    use lightbuilder_models::Noise;

    use super::super::tests::*;
    use super::*;
    use crate::{Actor, BakeSettings, Light, Material, Scene};

    #[test]
    fn point_light() {
        let fixture = Fixture::new(
            Scene::new().with_actor(quad(0.0, Material::default())).with_actor(
                Actor::new("lamp").with_component(Light::point(
                    vec3(0.1, 0.1, 2.0),
                    Vec3::ONE,
                    4.0,
                )),
            ),
        );

        let settings = BakeSettings::default().with_ambient(Vec3::ZERO);
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_relative_eq!(radiance.x, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn shadow() {
        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, Material::default()))
                .with_actor(quad(1.0, Material::default()))
                .with_actor(Actor::new("lamp").with_component(Light::point(
                    vec3(0.1, 0.1, 2.0),
                    Vec3::ONE,
                    4.0,
                ))),
        );

        let settings = BakeSettings::default().with_ambient(Vec3::splat(0.1));
        let mut integrator = fixture.integrator(&settings);

        // Between the quads, looking down; the lower quad is in shadow
        let radiance = integrator.radiance(down(0.5), &mut Noise::new(0));

        assert_relative_eq!(radiance.x, 0.1);
    }

    #[test]
    fn mirror() {
        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, Material::default().with_reflection(1.0)))
                .with_actor(quad(
                    2.0,
                    Material::default().with_diffuse(vec3(1.0, 0.5, 0.0)),
                )),
        );

        let settings = BakeSettings::default().with_ambient(Vec3::splat(0.3));
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(1.5), &mut Noise::new(0));

        assert_relative_eq!(radiance.x, 0.3);
        assert_relative_eq!(radiance.y, 0.15);
        assert_relative_eq!(radiance.z, 0.0);
    }

    #[test]
    fn mirrors_facing_each_other_terminate() {
        let mirror = Material::default()
            .with_diffuse(Vec3::ZERO)
            .with_reflection(1.0);

        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, mirror))
                .with_actor(quad(1.0, mirror)),
        );

        let settings = BakeSettings::default();
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(0.5), &mut Noise::new(0));

        assert_eq!(Vec3::ZERO, radiance);
    }

    #[test]
    fn glass() {
        let glass = Material::default()
            .with_diffuse(Vec3::ZERO)
            .with_refraction(1.0)
            .with_ior(1.5);

        let fixture = Fixture::new(
            Scene::new()
                .with_actor(quad(0.0, glass))
                .with_actor(quad(-1.0, Material::default())),
        );

        let settings = BakeSettings::default().with_ambient(Vec3::ONE);
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        // Most of the energy goes through the glass onto the diffuse quad
        assert_relative_eq!(radiance.x, 0.96, epsilon = 1e-3);
    }

    #[test]
    fn emissive() {
        let fixture = Fixture::new(Scene::new().with_actor(quad(
            0.0,
            Material::default()
                .with_diffuse(Vec3::ZERO)
                .with_emissive(vec3(2.0, 0.0, 0.0)),
        )));

        let settings = BakeSettings::default();
        let mut integrator = fixture.integrator(&settings);
        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_eq!(vec3(2.0, 0.0, 0.0), radiance);
    }
}
