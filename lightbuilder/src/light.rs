use glam::{Affine3A, Vec3};
use lightbuilder_models::{BoundingBox, Noise, Ray, TRACER_EPSILON};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    /// Uniform term added to every lit point; casts no shadows.
    Ambient,

    Point,

    /// Point light restricted to a cone of given angle (in radians) around
    /// its direction.
    Spot { angle: f32 },

    /// Infinitely distant light shining along its direction.
    Directional,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    kind: LightKind,
    position: Vec3,
    direction: Vec3,
    color: Vec3,
    intensity: f32,
    range: f32,
}

impl Light {
    pub fn ambient(color: Vec3) -> Self {
        Self::new(LightKind::Ambient, color)
    }

    pub fn point(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Point, color)
            .with_position(position)
            .with_intensity(intensity)
    }

    pub fn spot(
        position: Vec3,
        direction: Vec3,
        angle: f32,
        color: Vec3,
        intensity: f32,
    ) -> Self {
        Self::new(LightKind::Spot { angle }, color)
            .with_position(position)
            .with_direction(direction)
            .with_intensity(intensity)
    }

    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional, color)
            .with_direction(direction)
            .with_intensity(intensity)
    }

    fn new(kind: LightKind, color: Vec3) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            color,
            intensity: 1.0,
            range: 0.0,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction.normalize_or_zero();
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Limits the light's reach; zero means physically-based inverse-square
    /// falloff with unlimited range.
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range.max(0.0);
        self
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Returns color multiplied by intensity.
    pub fn power(&self) -> Vec3 {
        self.color * self.intensity
    }

    pub(crate) fn transformed(&self, xform: Affine3A) -> Self {
        Self {
            position: xform.transform_point3(self.position),
            direction: xform
                .transform_vector3(self.direction)
                .normalize_or_zero(),
            ..*self
        }
    }

    /// Evaluates how much light reaches `point` (with given surface `normal`)
    /// from this light, ignoring occluders.
    ///
    /// Returns `None` for ambient lights and for points this light doesn't
    /// reach.
    pub fn illuminate(
        &self,
        point: Vec3,
        normal: Vec3,
    ) -> Option<Illumination> {
        let (direction, distance, attenuation) = match self.kind {
            LightKind::Ambient => return None,

            LightKind::Directional => {
                (-self.direction, f32::MAX, 1.0)
            }

            LightKind::Point | LightKind::Spot { .. } => {
                let to_light = self.position - point;
                let distance = to_light.length();

                if distance <= TRACER_EPSILON {
                    return None;
                }

                let direction = to_light / distance;

                if let LightKind::Spot { angle } = self.kind {
                    let cos = (-direction).dot(self.direction);

                    if cos < (angle * 0.5).cos() {
                        return None;
                    }
                }

                let attenuation = if self.range > 0.0 {
                    (1.0 - distance / self.range).max(0.0).powi(2)
                } else {
                    1.0 / (distance * distance).max(TRACER_EPSILON)
                };

                (direction, distance, attenuation)
            }
        };

        let n_dot_l = normal.dot(direction);

        if n_dot_l <= 0.0 || attenuation <= 0.0 {
            return None;
        }

        Some(Illumination {
            direction,
            distance,
            radiance: self.power() * n_dot_l * attenuation,
        })
    }

    /// Generates a photon ray leaving this light; `scene_bounds` is used to
    /// aim directional lights at the scene.
    pub(crate) fn emit(
        &self,
        noise: &mut Noise,
        scene_bounds: &BoundingBox,
    ) -> Option<Ray> {
        match self.kind {
            LightKind::Ambient => None,

            LightKind::Point => {
                Some(Ray::new(self.position, noise.sample_sphere()))
            }

            LightKind::Spot { angle } => Some(Ray::new(
                self.position,
                noise.sample_cone(self.direction, angle * 0.5),
            )),

            LightKind::Directional => {
                if !scene_bounds.is_set() {
                    return None;
                }

                let radius = scene_bounds.extent().length() * 0.5;
                let (t, b) = self.direction.any_orthonormal_pair();
                let disk = noise.sample_disk() * radius;

                let origin = scene_bounds.center()
                    - self.direction * (radius + 1.0)
                    + t * disk.x
                    + b * disk.y;

                Some(Ray::new(origin, self.direction))
            }
        }
    }
}

/// Light arriving at a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Illumination {
    /// Direction from the point towards the light.
    pub direction: Vec3,

    /// Distance to the light (`f32::MAX` for directional lights).
    pub distance: f32,

    pub radiance: Vec3,
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn point() {
        let light = Light::point(vec3(0.0, 2.0, 0.0), Vec3::ONE, 4.0);
        let ill = light.illuminate(Vec3::ZERO, Vec3::Y).unwrap();

        assert_relative_eq!(ill.distance, 2.0);
        assert_relative_eq!(ill.radiance.x, 1.0);
        assert_eq!(Vec3::Y, ill.direction);

        assert!(light.illuminate(Vec3::ZERO, Vec3::NEG_Y).is_none());
    }

    #[test]
    fn range() {
        let light =
            Light::point(vec3(0.0, 2.0, 0.0), Vec3::ONE, 1.0).with_range(1.5);

        assert!(light.illuminate(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn spot() {
        let light = Light::spot(
            vec3(0.0, 1.0, 0.0),
            Vec3::NEG_Y,
            0.5,
            Vec3::ONE,
            1.0,
        );

        assert!(light.illuminate(Vec3::ZERO, Vec3::Y).is_some());
        assert!(light.illuminate(vec3(2.0, 0.0, 0.0), Vec3::Y).is_none());
    }

    #[test]
    fn directional() {
        let light = Light::directional(Vec3::NEG_Y, Vec3::ONE, 2.0);
        let ill = light.illuminate(Vec3::ZERO, Vec3::Y).unwrap();

        assert_eq!(f32::MAX, ill.distance);
        assert_relative_eq!(ill.radiance.y, 2.0);
    }

    #[test]
    fn ambient() {
        assert!(Light::ambient(Vec3::ONE)
            .illuminate(Vec3::ZERO, Vec3::Y)
            .is_none());
    }

    #[test]
    fn transformed() {
        let light = Light::point(Vec3::ZERO, Vec3::ONE, 1.0)
            .transformed(Affine3A::from_translation(vec3(1.0, 2.0, 3.0)));

        assert_eq!(vec3(1.0, 2.0, 3.0), light.position());
    }
}
