use core::f32::consts::PI;

use glam::{vec2, vec3, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded source of uniform samples.
///
/// Every worker owns its own instance, so that bakes started with the same
/// seed produce the same image regardless of how tiles got scheduled.
#[derive(Clone, Debug)]
pub struct Noise {
    rng: StdRng,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a noise for given stream (e.g. a tile) derived from `seed`.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::new(seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }

    /// Generates a uniform sample in range `<0.0, 1.0)`.
    pub fn sample(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generates a uniform sample on a circle.
    pub fn sample_circle(&mut self) -> Vec2 {
        let angle = self.sample() * PI * 2.0;

        vec2(angle.cos(), angle.sin())
    }

    /// Generates a uniform sample inside of a disk.
    pub fn sample_disk(&mut self) -> Vec2 {
        let radius = self.sample().sqrt();

        self.sample_circle() * radius
    }

    /// Generates a uniform direction on the unit sphere.
    pub fn sample_sphere(&mut self) -> Vec3 {
        let phi = self.sample() * 2.0 * PI;
        let cos_theta = self.sample() * 2.0 - 1.0;
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        vec3(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
    }

    /// Generates a cosine-weighted direction on the hemisphere around given
    /// normal.
    pub fn sample_hemisphere(&mut self, normal: Vec3) -> Vec3 {
        let normal = normal.normalize_or_zero();

        if normal == Vec3::ZERO {
            return self.sample_sphere();
        }

        let disk = self.sample_disk();
        let up = (1.0 - disk.length_squared()).max(0.0).sqrt();
        let (t, b) = normal.any_orthonormal_pair();

        (disk.x * t + disk.y * b + up * normal).normalize_or_zero()
    }

    /// Generates a uniform direction inside of a cone around `axis` with
    /// given half-angle (in radians).
    pub fn sample_cone(&mut self, axis: Vec3, half_angle: f32) -> Vec3 {
        let axis = axis.normalize_or_zero();

        if axis == Vec3::ZERO {
            return self.sample_sphere();
        }

        let cos_max = half_angle.clamp(0.0, PI).cos();
        let cos_theta = 1.0 - self.sample() * (1.0 - cos_max);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = self.sample() * 2.0 * PI;
        let (t, b) = axis.any_orthonormal_pair();

        (t * phi.cos() * sin_theta + b * phi.sin() * sin_theta
            + axis * cos_theta)
            .normalize_or_zero()
    }
}
