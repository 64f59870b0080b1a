use crate::{F32Ext, TRACER_EPSILON};

/// Schlick's approximation of the Fresnel reflectance.
///
/// `cos_theta` is the cosine between the incoming direction (pointing away
/// from the surface) and the normal, `eta` is the ratio of indices of
/// refraction (incoming over outgoing). Returns `1.0` on total internal
/// reflection.
pub fn fresnel(cos_theta: f32, eta: f32) -> f32 {
    if !eta.is_finite() || eta <= TRACER_EPSILON {
        return 1.0;
    }

    let r0 = ((1.0 - eta) / (1.0 + eta)).sqr();
    let mut cos = cos_theta.saturate();

    if eta > 1.0 {
        let sin2_t = eta.sqr() * (1.0 - cos.sqr());

        if sin2_t >= 1.0 {
            return 1.0;
        }

        cos = (1.0 - sin2_t).sqrt();
    }

    (r0 + (1.0 - r0) * (1.0 - cos).powi(5)).saturate()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn normal_incidence() {
        assert_relative_eq!(fresnel(1.0, 1.0 / 1.5), 0.04, epsilon = 1e-5);
    }

    #[test]
    fn grazing() {
        assert_relative_eq!(fresnel(0.0, 1.0 / 1.5), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn index_matched() {
        assert_relative_eq!(fresnel(1.0, 1.0), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn total_internal_reflection() {
        assert_eq!(1.0, fresnel(0.1, 1.5));
    }

    #[test]
    fn degenerate_eta() {
        assert_eq!(1.0, fresnel(0.5, 0.0));
        assert_eq!(1.0, fresnel(0.5, f32::NAN));
    }
}
