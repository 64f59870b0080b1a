use glam::Vec3;

use crate::{BoundingBox, Noise, Vec3Ext};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    /// How far to move a continuation ray's origin away from its surface to
    /// avoid self-intersection
    pub const NUDGE_OFFSET: f32 = 0.0005;

    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize_or_zero();

        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }

    /// Returns distance to the nearest point of given box, zero if this ray
    /// starts inside it or `f32::MAX` if the box is missed.
    pub fn distance_to_box(&self, bb: &BoundingBox) -> f32 {
        if !bb.is_set() || self.is_degenerate() {
            return f32::MAX;
        }

        let hit_min = (bb.min() - self.origin) * self.inv_direction;
        let hit_max = (bb.max() - self.origin) * self.inv_direction;

        let tmin = hit_min.min(hit_max).max_element();
        let tmax = hit_min.max(hit_max).min_element();

        if tmax >= tmin && tmax >= 0.0 {
            tmin.max(0.0)
        } else {
            f32::MAX
        }
    }

    /// Returns whether this ray hits given box closer than `max_distance`.
    pub fn hits_box(&self, bb: &BoundingBox, max_distance: f32) -> bool {
        let distance = self.distance_to_box(bb);

        distance < f32::MAX && distance <= max_distance
    }

    /// Mirrors this ray around `normal` at `point`.
    pub fn reflect(&self, normal: Vec3, point: Vec3) -> Self {
        Self::new(
            point + normal * Self::NUDGE_OFFSET,
            self.direction.reflect(normal),
        )
    }

    /// Bends this ray through the surface at `point`; `eta` is the ratio of
    /// indices of refraction.
    ///
    /// Returns `None` on total internal reflection.
    pub fn refract(&self, normal: Vec3, point: Vec3, eta: f32) -> Option<Self> {
        let direction = self.direction.refract(normal, eta)?;

        Some(Self::new(point - normal * Self::NUDGE_OFFSET, direction))
    }

    /// Continues this ray into a random, cosine-weighted direction on the
    /// hemisphere around `normal`.
    pub fn diffuse(
        &self,
        normal: Vec3,
        point: Vec3,
        noise: &mut Noise,
    ) -> Self {
        Self::new(
            point + normal * Self::NUDGE_OFFSET,
            noise.sample_hemisphere(normal),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn distance_to_box() {
        let bb = BoundingBox::new(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0));

        let ray = Ray::new(vec3(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_relative_eq!(ray.distance_to_box(&bb), 4.0);

        let ray = Ray::new(vec3(0.0, 0.0, 5.0), Vec3::Z);
        assert_eq!(f32::MAX, ray.distance_to_box(&bb));

        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(0.0, ray.distance_to_box(&bb));

        let ray = Ray::new(vec3(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(f32::MAX, ray.distance_to_box(&bb));
    }

    #[test]
    fn flat_box() {
        let bb = BoundingBox::new(vec3(-1.0, -1.0, 0.0), vec3(1.0, 1.0, 0.0));
        let ray = Ray::new(vec3(0.25, 0.5, 2.0), Vec3::NEG_Z);

        assert!(ray.hits_box(&bb, 10.0));
        assert!(!ray.hits_box(&bb, 1.0));
    }

    #[test]
    fn degenerate_direction() {
        let bb = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);

        assert!(ray.is_degenerate());
        assert!(!ray.hits_box(&bb, f32::MAX));
    }
}
