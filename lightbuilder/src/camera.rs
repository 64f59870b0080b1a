use glam::{vec3, Vec3};
use lightbuilder_models::Ray;

/// Perspective camera the bake is rendered from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    fov: f32,
    aspect: f32,
    focal_distance: f32,
}

impl Camera {
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - position).normalize_or_zero();
        let forward = if forward == Vec3::ZERO {
            Vec3::NEG_Z
        } else {
            forward
        };

        let mut right = forward.cross(up).normalize_or_zero();

        if right == Vec3::ZERO {
            right = forward.any_orthonormal_vector();
        }

        let up = right.cross(forward);

        Self {
            position,
            forward,
            right,
            up,
            fov: 60.0_f32.to_radians(),
            aspect: 1.0,
            focal_distance: (target - position).length(),
        }
    }

    /// Sets vertical field of view, in radians.
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Distance to the point the camera was aimed at.
    pub fn focal_distance(&self) -> f32 {
        self.focal_distance
    }

    /// Casts a primary ray through given viewport coordinates, where (0, 0)
    /// is the top-left corner and (1, 1) is the bottom-right one.
    pub fn cast_ray(&self, u: f32, v: f32) -> Ray {
        let half_height = (self.fov * 0.5).tan();
        let half_width = half_height * self.aspect;
        let ndc = vec3(2.0 * u - 1.0, 1.0 - 2.0 * v, 1.0);

        let direction = self.forward
            + self.right * (ndc.x * half_width)
            + self.up * (ndc.y * half_height);

        Ray::new(self.position, direction)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_at(vec3(0.0, 0.0, 1.0), Vec3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn center_ray() {
        let camera =
            Camera::looking_at(vec3(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);

        let ray = camera.cast_ray(0.5, 0.5);

        assert_relative_eq!(ray.direction().z, -1.0);
        assert_relative_eq!(camera.focal_distance(), 5.0);
    }

    #[test]
    fn corners() {
        let camera = Camera::default();
        let top_left = camera.cast_ray(0.0, 0.0).direction();

        assert!(top_left.x < 0.0);
        assert!(top_left.y > 0.0);
    }

    #[test]
    fn aspect_keeps_pixels_square() {
        let camera = Camera::default().with_aspect(320.0 / 240.0);
        let top_left = camera.cast_ray(0.0, 0.0).direction();

        assert_relative_eq!(-top_left.x / top_left.y, 320.0 / 240.0);
    }

    #[test]
    fn degenerate_up() {
        let camera = Camera::looking_at(Vec3::ZERO, Vec3::NEG_Y, Vec3::Y);

        assert_relative_eq!(camera.right().length(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.up().length(), 1.0, epsilon = 1e-5);
    }
}
