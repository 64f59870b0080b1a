use lightbuilder_models::{Noise, Vec3Ext};

use super::*;
use crate::utils::metrics;
use crate::{Bvh, Geometry, LightKind, PhotonSettings};

/// Scatters photons from every light through the scene and collects the ones
/// that land on diffuse surfaces into a [`PhotonTree`].
#[derive(Default)]
pub struct PhotonMapBuilder;

impl PhotonMapBuilder {
    pub fn build(
        geometry: &Geometry,
        bvh: &Bvh,
        settings: &PhotonSettings,
    ) -> PhotonTree {
        let (photons, tt_emit) =
            metrics::measure(|| Self::emit(geometry, bvh, settings));

        let count = photons.len();

        let (tree, tt_tree) = metrics::measure(|| {
            PhotonTree::build(photons, settings.max_tree_depth())
        });

        log::info!(
            "Photon tree has been constructed; photons = {}, nodes = {}, \
             tt-emit = {}, tt-tree = {}",
            count,
            tree.nodes().len(),
            metrics::display(tt_emit),
            metrics::display(tt_tree),
        );

        tree
    }

    fn emit(
        geometry: &Geometry,
        bvh: &Bvh,
        settings: &PhotonSettings,
    ) -> Vec<Photon> {
        let bounds = geometry.bounds();
        let mut photons = Vec::new();

        for (light_idx, light) in geometry.lights().iter().enumerate() {
            if light.kind() == LightKind::Ambient {
                continue;
            }

            let mut noise = Noise::for_stream(settings.seed, light_idx as u64);

            for _ in 0..settings.samples {
                let Some(mut ray) = light.emit(&mut noise, &bounds) else {
                    break;
                };

                let mut radiance = light.power();
                let mut diffuse_bounces = 1;
                let mut specular_bounces = 0;

                while diffuse_bounces <= settings.diffuse
                    && specular_bounces <= settings.caustic
                {
                    let Some(hit) = bvh.trace_nearest(geometry, &ray) else {
                        break;
                    };

                    let Some(triangle) = hit.triangle else {
                        break;
                    };

                    let surface = geometry.surface(&triangle, hit.weights);
                    let material = surface.material;
                    let interface = surface.interface(ray.direction());
                    let point = ray.at(hit.distance);

                    radiance = radiance.min(material.diffuse());

                    let normal = interface.normal;
                    let fresnel = interface.fresnel;
                    let refract = material.refraction() * (1.0 - fresnel);
                    let reflect = material.reflection() * fresnel;

                    if noise.sample() < refract {
                        ray = ray
                            .refract(normal, point, interface.eta)
                            .unwrap_or_else(|| ray.reflect(normal, point));

                        specular_bounces += 1;
                    } else if noise.sample() < reflect {
                        ray = ray.reflect(normal, point);
                        specular_bounces += 1;
                    } else {
                        radiance *= 1.0 / (diffuse_bounces as f32).sqrt();

                        photons.push(Photon {
                            position: point,
                            direction: ray.direction(),
                            radiance,
                        });

                        ray = ray.diffuse(normal, point, &mut noise);
                        diffuse_bounces += 1;
                    }

                    if radiance.is_black() {
                        break;
                    }
                }
            }
        }

        photons
    }
}
