use glam::{Vec2, Vec3};

use crate::{Ray, TRACER_EPSILON};

/// How far outside of a triangle (in barycentric units) a ray may land and
/// still count as a hit; keeps rays from slipping through shared edges.
pub const EDGE_TOLERANCE: f32 = 0.00001;

/// Result of intersecting a ray with a single triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleHit {
    pub distance: f32,
    pub u: f32,
    pub v: f32,
}

impl TriangleHit {
    /// Returns barycentric weights of the first, second and third vertex.
    pub fn weights(&self) -> Vec3 {
        Vec3::new(1.0 - self.u - self.v, self.u, self.v)
    }
}

/// Intersects `ray` with triangle `[v0, v1, v2]`, returning the hit only if
/// it's closer than `max_distance`.
///
/// Both faces are hittable.
pub fn hit_triangle(
    ray: &Ray,
    [v0, v1, v2]: [Vec3; 3],
    max_distance: f32,
) -> Option<TriangleHit> {
    let v0v1 = v1 - v0;
    let v0v2 = v2 - v0;

    // ---

    let pvec = ray.direction().cross(v0v2);
    let det = v0v1.dot(pvec);

    if det.abs() < f32::EPSILON {
        return None;
    }

    // ---

    let inv_det = 1.0 / det;
    let tvec = ray.origin() - v0;
    let u = tvec.dot(pvec) * inv_det;
    let qvec = tvec.cross(v0v1);
    let v = ray.direction().dot(qvec) * inv_det;
    let distance = v0v2.dot(qvec) * inv_det;

    if (u < -EDGE_TOLERANCE)
        | (v < -EDGE_TOLERANCE)
        | (u + v > 1.0 + EDGE_TOLERANCE)
        | (distance <= 0.0)
        | (distance >= max_distance)
    {
        return None;
    }

    Some(TriangleHit { distance, u, v })
}

/// Returns barycentric weights of `point` if it lays inside the 2D triangle
/// `[a, b, c]`.
pub fn locate_in_triangle(point: Vec2, [a, b, c]: [Vec2; 3]) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    let ap = point - a;
    let det = ab.perp_dot(ac);

    if det.abs() <= TRACER_EPSILON {
        return None;
    }

    let u = ap.perp_dot(ac) / det;
    let v = ab.perp_dot(ap) / det;
    let tolerance = -TRACER_EPSILON;

    if u < tolerance || v < tolerance || u + v > 1.0 - tolerance {
        None
    } else {
        Some(Vec3::new(1.0 - u - v, u, v))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec2, vec3};

    use super::*;

    const TRIANGLE: [Vec3; 3] = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ];

    #[test]
    fn hit() {
        let ray = Ray::new(vec3(0.25, 0.25, 2.0), Vec3::NEG_Z);
        let hit = hit_triangle(&ray, TRIANGLE, f32::MAX).unwrap();

        assert_relative_eq!(hit.distance, 2.0);
        assert_relative_eq!(hit.u, 0.25);
        assert_relative_eq!(hit.v, 0.25);
        assert_relative_eq!(hit.weights().x, 0.5);
    }

    #[test]
    fn hit_from_behind() {
        let ray = Ray::new(vec3(0.25, 0.25, -2.0), Vec3::Z);

        assert!(hit_triangle(&ray, TRIANGLE, f32::MAX).is_some());
    }

    #[test]
    fn miss() {
        let ray = Ray::new(vec3(0.75, 0.75, 2.0), Vec3::NEG_Z);
        assert!(hit_triangle(&ray, TRIANGLE, f32::MAX).is_none());

        let ray = Ray::new(vec3(0.25, 0.25, 2.0), Vec3::Z);
        assert!(hit_triangle(&ray, TRIANGLE, f32::MAX).is_none());

        let ray = Ray::new(vec3(0.25, 0.25, 2.0), Vec3::NEG_Z);
        assert!(hit_triangle(&ray, TRIANGLE, 1.5).is_none());
    }

    #[test]
    fn shared_edge_is_watertight() {
        let other = [TRIANGLE[1], Vec3::new(1.0, 1.0, 0.0), TRIANGLE[2]];

        for i in 0..=1000 {
            let t = i as f32 / 1000.0;
            let target = vec3(1.0 - t, t, 0.0);

            for origin in [vec3(0.3, 0.7, 2.0), vec3(-1.3, 0.2, 0.9)] {
                let ray = Ray::new(origin, target - origin);

                assert!(
                    hit_triangle(&ray, TRIANGLE, f32::MAX).is_some()
                        || hit_triangle(&ray, other, f32::MAX).is_some(),
                    "ray towards {} slipped through the edge",
                    target,
                );
            }
        }
    }

    #[test]
    fn locate() {
        let tri = [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)];

        let w = locate_in_triangle(vec2(0.5, 0.25), tri).unwrap();
        assert_relative_eq!(w.y, 0.5);
        assert_relative_eq!(w.z, 0.25);

        assert_eq!(None, locate_in_triangle(vec2(0.8, 0.8), tri));
    }
}
