use glam::Vec3;

use super::*;
use crate::Photon;

impl Integrator<'_> {
    pub(super) fn photon_map(
        &mut self,
        vertex: &PathVertex,
        surface: &Surface,
    ) -> Vec3 {
        let normal = surface.interface(vertex.ray.direction()).normal;
        let rgb =
            self.gather(surface.point, normal) + surface.material.emissive();

        rgb * vertex.power
    }

    /// Estimates radiance at given point from the photons around it.
    pub(super) fn gather(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let Some(photons) = self.photons else {
            return Vec3::ZERO;
        };

        let settings = self.settings.photons();
        let exposure = settings.exposure();

        let weight = |photon: &Photon, distance_squared: f32| {
            let facing = (-normal.dot(photon.direction)).max(0.0);
            let falloff = (1.0 - distance_squared.sqrt()).max(0.0);

            photon.radiance * (facing * falloff / exposure)
        };

        if settings.auto_collect {
            photons
                .nearest(point, settings.radius, settings.count as usize)
                .into_iter()
                .map(|candidate| {
                    weight(candidate.photon, candidate.distance_squared)
                })
                .sum()
        } else {
            let mut energy = Vec3::ZERO;

            photons.for_each_within(point, settings.radius, |photon, dist| {
                energy += weight(photon, dist);
            });

            energy
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;
    use lightbuilder_models::Noise;

    use super::super::tests::*;
    use super::*;
    use crate::{BakeSettings, CollectKind, Material, PhotonSettings, Scene};

    fn photon(x: f32) -> Photon {
        Photon {
            position: vec3(0.1 + x, 0.1, 0.0),
            direction: Vec3::NEG_Z,
            radiance: Vec3::splat(0.5),
        }
    }

    fn gather(settings: PhotonSettings) -> Vec3 {
        let fixture = Fixture::new(
            Scene::new().with_actor(quad(0.0, Material::default())),
        );

        let tree = PhotonTree::build(
            vec![photon(0.0), photon(0.3), photon(0.6), photon(-2.0)],
            33,
        );

        let settings = BakeSettings::default()
            .with_bounce_engines(
                CollectKind::PhotonMapping,
                CollectKind::PhotonMapping,
            )
            .with_photons(PhotonSettings {
                samples: 100,
                ..settings
            });

        let mut integrator = Integrator::new(
            &fixture.geometry,
            &fixture.bvh,
            Some(&tree),
            &settings,
        );

        integrator.radiance(down(1.0), &mut Noise::new(0))
    }

    #[test]
    fn within_radius() {
        let radiance = gather(PhotonSettings {
            radius: 0.5,
            ..Default::default()
        });

        assert_relative_eq!(radiance.x, 0.5 + 0.5 * 0.7, epsilon = 1e-5);
    }

    #[test]
    fn nearest() {
        let radiance = gather(PhotonSettings {
            auto_collect: true,
            count: 1,
            ..Default::default()
        });

        assert_relative_eq!(radiance.x, 0.5, epsilon = 1e-5);

        let radiance = gather(PhotonSettings {
            auto_collect: true,
            count: 3,
            radius: 1.0,
            ..Default::default()
        });

        assert_relative_eq!(
            radiance.x,
            0.5 + 0.5 * 0.7 + 0.5 * 0.4,
            epsilon = 1e-5
        );
    }

    #[test]
    fn nearest_is_limited_by_radius() {
        let radiance = gather(PhotonSettings {
            auto_collect: true,
            count: 3,
            radius: 0.5,
            ..Default::default()
        });

        assert_relative_eq!(radiance.x, 0.5 + 0.5 * 0.7, epsilon = 1e-5);
    }

    #[test]
    fn photons_from_behind_are_ignored() {
        let fixture = Fixture::new(
            Scene::new().with_actor(quad(0.0, Material::default())),
        );

        let tree = PhotonTree::build(
            vec![Photon {
                direction: Vec3::Z,
                ..photon(0.0)
            }],
            33,
        );

        let settings = BakeSettings::default().with_bounce_engines(
            CollectKind::PhotonMapping,
            CollectKind::BackTracing,
        );

        let mut integrator = Integrator::new(
            &fixture.geometry,
            &fixture.bvh,
            Some(&tree),
            &settings,
        );

        let radiance = integrator.radiance(down(1.0), &mut Noise::new(0));

        assert_eq!(Vec3::ZERO, radiance);
    }
}
