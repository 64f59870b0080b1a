use glam::Vec3;

use crate::{Error, Result};

/// Light-transport algorithm used for a bounce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollectKind {
    /// Direct lighting plus recursive mirror / glass rays.
    #[default]
    BackTracing,

    /// Radiance estimated from the nearby photons.
    PhotonMapping,

    /// Single random continuation per bounce ("brute force").
    PathTracing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSettings {
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            cell_width: 32,
            cell_height: 32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    pub f_number: f32,

    /// When set, focus lands on the camera's target instead of at
    /// `focal_length`.
    pub target: bool,

    pub focal_length: f32,
    pub dof: bool,

    /// Each pixel gets `subdivisions²` aperture samples when DOF is enabled.
    pub subdivisions: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            f_number: 1.0,
            target: true,
            focal_length: 1.0,
            dof: false,
            subdivisions: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathTracingSettings {
    /// Each pixel gets `subdivisions²` samples.
    pub subdivisions: u32,
    pub max_bounces: u32,
}

impl Default for PathTracingSettings {
    fn default() -> Self {
        Self {
            subdivisions: 1,
            max_bounces: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhotonSettings {
    /// Photons emitted per light.
    pub samples: u32,

    /// Maximum number of diffuse bounces per photon.
    pub diffuse: u32,

    /// Maximum number of mirror / glass bounces per photon.
    pub caustic: u32,

    /// Gather at most `count` nearest photons within `radius` instead of all
    /// of them.
    pub auto_collect: bool,

    pub radius: f32,
    pub count: u32,
    pub seed: u64,

    /// Photon tree gets at most `tree_depth * 3` levels (one per axis).
    pub tree_depth: u32,
}

impl Default for PhotonSettings {
    fn default() -> Self {
        Self {
            samples: 1000,
            diffuse: 5,
            caustic: 5,
            auto_collect: false,
            radius: 0.5,
            count: 50,
            seed: 0,
            tree_depth: 11,
        }
    }
}

impl PhotonSettings {
    pub fn max_tree_depth(&self) -> u32 {
        if self.tree_depth == 0 {
            33
        } else {
            self.tree_depth.saturating_mul(3)
        }
    }

    /// Energy scale photon radiance is divided by when gathering.
    pub fn exposure(&self) -> f32 {
        (self.samples as f32 * 0.01).max(f32::EPSILON)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BakeSettings {
    first_bounce: CollectKind,
    second_bounce: CollectKind,
    ambient: Vec3,
    max_threads: usize,
    seed: u64,
    tiles: TileSettings,
    camera: CameraSettings,
    path_tracing: PathTracingSettings,
    photons: PhotonSettings,
}

impl BakeSettings {
    pub fn with_bounce_engines(
        mut self,
        first: CollectKind,
        second: CollectKind,
    ) -> Self {
        self.first_bounce = first;
        self.second_bounce = second;
        self
    }

    pub fn with_ambient(mut self, ambient: Vec3) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cell_size(mut self, width: u32, height: u32) -> Self {
        self.tiles.cell_width = width;
        self.tiles.cell_height = height;
        self
    }

    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_path_tracing(
        mut self,
        subdivisions: u32,
        bounces: u32,
    ) -> Self {
        self.path_tracing = PathTracingSettings {
            subdivisions,
            max_bounces: bounces,
        };
        self
    }

    pub fn with_photons(mut self, photons: PhotonSettings) -> Self {
        self.photons = photons;
        self
    }

    pub fn first_bounce(&self) -> CollectKind {
        self.first_bounce
    }

    pub fn second_bounce(&self) -> CollectKind {
        self.second_bounce
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tiles(&self) -> &TileSettings {
        &self.tiles
    }

    pub fn camera(&self) -> &CameraSettings {
        &self.camera
    }

    pub fn path_tracing(&self) -> &PathTracingSettings {
        &self.path_tracing
    }

    pub fn photons(&self) -> &PhotonSettings {
        &self.photons
    }

    /// Number of sample passes each task performs.
    pub fn spp(&self) -> u32 {
        if self.first_bounce == CollectKind::PathTracing {
            self.path_tracing.subdivisions.pow(2)
        } else {
            1
        }
    }

    /// Number of diffuse bounces a single path may take.
    pub fn max_diffuse_bounces(&self) -> u32 {
        if self.first_bounce == CollectKind::PathTracing {
            self.path_tracing.max_bounces
        } else {
            1
        }
    }

    /// Number of aperture samples per pixel.
    pub fn camera_spp(&self) -> u32 {
        if self.camera.dof {
            self.camera.subdivisions.pow(2)
        } else {
            1
        }
    }

    pub fn needs_photons(&self) -> bool {
        self.first_bounce == CollectKind::PhotonMapping
            || self.second_bounce == CollectKind::PhotonMapping
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_threads == 0 {
            return Err(Error::NoWorkers);
        }

        if self.tiles.cell_width == 0 || self.tiles.cell_height == 0 {
            return Err(Error::EmptyCell {
                width: self.tiles.cell_width,
                height: self.tiles.cell_height,
            });
        }

        if self.path_tracing.subdivisions == 0 {
            return Err(Error::InvalidSubdivisions("path tracing subdivisions"));
        }

        if self.camera.subdivisions == 0 {
            return Err(Error::InvalidSubdivisions("camera subdivisions"));
        }

        let f_number = self.camera.f_number;

        if self.camera.dof && (f_number.is_nan() || f_number <= 0.0) {
            return Err(Error::InvalidFNumber(f_number));
        }

        Ok(())
    }
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            first_bounce: CollectKind::BackTracing,
            second_bounce: CollectKind::BackTracing,
            ambient: Vec3::splat(0.2),
            max_threads: 1,
            seed: 0,
            tiles: Default::default(),
            camera: Default::default(),
            path_tracing: Default::default(),
            photons: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        BakeSettings::default().validate().unwrap();
    }

    #[test]
    fn spp() {
        let settings = BakeSettings::default().with_path_tracing(3, 4);

        assert_eq!(1, settings.spp());
        assert_eq!(1, settings.max_diffuse_bounces());

        let settings = settings.with_bounce_engines(
            CollectKind::PathTracing,
            CollectKind::BackTracing,
        );

        assert_eq!(9, settings.spp());
        assert_eq!(4, settings.max_diffuse_bounces());
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            BakeSettings::default().with_max_threads(0).validate(),
            Err(Error::NoWorkers)
        ));

        assert!(matches!(
            BakeSettings::default().with_cell_size(0, 4).validate(),
            Err(Error::EmptyCell { .. })
        ));

        assert!(matches!(
            BakeSettings::default().with_path_tracing(0, 1).validate(),
            Err(Error::InvalidSubdivisions(_))
        ));

        let camera = CameraSettings {
            dof: true,
            f_number: 0.0,
            ..Default::default()
        };

        assert!(matches!(
            BakeSettings::default().with_camera(camera).validate(),
            Err(Error::InvalidFNumber(_))
        ));
    }
}
