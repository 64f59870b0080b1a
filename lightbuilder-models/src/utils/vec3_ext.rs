use glam::Vec3;

use crate::TRACER_EPSILON;

pub trait Vec3Ext
where
    Self: Sized,
{
    /// Reflects this direction-vector around `normal`.
    fn reflect(self, normal: Self) -> Self;

    /// Refracts this direction-vector through a surface with given `normal`,
    /// where `eta` is the ratio of indices of refraction (incoming over
    /// outgoing).
    ///
    /// Returns `None` on total internal reflection.
    fn refract(self, normal: Self, eta: f32) -> Option<Self>;

    /// Returns whether all channels of this color-vector are (almost) zero.
    fn is_black(self) -> bool;

    /// Returns whether any channel of this color-vector drops below `min`.
    fn any_below(self, min: f32) -> bool;
}

impl Vec3Ext for Vec3 {
    fn reflect(self, normal: Self) -> Self {
        self - 2.0 * normal.dot(self) * normal
    }

    fn refract(self, normal: Self, eta: f32) -> Option<Self> {
        let cos_i = -normal.dot(self);
        let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);

        if k < 0.0 {
            None
        } else {
            let dir = eta * self + (eta * cos_i - k.sqrt()) * normal;

            Some(dir.normalize_or_zero())
        }
    }

    fn is_black(self) -> bool {
        self.max_element() <= TRACER_EPSILON
    }

    fn any_below(self, min: f32) -> bool {
        self.min_element() < min
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn reflect() {
        let dir = vec3(1.0, -1.0, 0.0).normalize();
        let actual = dir.reflect(Vec3::Y);

        assert_relative_eq!(actual.x, dir.x);
        assert_relative_eq!(actual.y, -dir.y);
    }

    #[test]
    fn refract_straight_through() {
        let actual = Vec3::NEG_Y.refract(Vec3::Y, 1.0 / 1.5).unwrap();

        assert_relative_eq!(actual.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn refract_total_internal_reflection() {
        let dir = vec3(1.0, -0.1, 0.0).normalize();

        assert_eq!(None, dir.refract(Vec3::Y, 1.5));
    }
}
