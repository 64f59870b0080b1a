use std::cmp::Ordering;

use glam::Vec3;

/// Light energy deposited on a diffuse surface during photon emission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Photon {
    pub position: Vec3,

    /// Direction the photon was travelling in when it landed.
    pub direction: Vec3,

    pub radiance: Vec3,
}

/// Photon found by a nearest-neighbour query, together with its squared
/// distance to the query point.
#[derive(Clone, Copy, Debug)]
pub struct PhotonCandidate<'a> {
    pub photon: &'a Photon,
    pub distance_squared: f32,
}

impl PartialEq for PhotonCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PhotonCandidate<'_> {}

impl PartialOrd for PhotonCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhotonCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared.total_cmp(&other.distance_squared)
    }
}
