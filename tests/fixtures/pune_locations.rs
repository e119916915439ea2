//! Synthetic delivery locations around Pune.
//!
//! Points are scattered within ~1 km of two region anchors (Aundh and
//! Shivajinagar). A seeded ChaCha generator keeps every run identical.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Region anchors as (lat, lng).
pub const REGION_ANCHORS: [(f64, f64); 2] = [(18.627160, 73.810552), (18.621160, 73.860552)];

/// Midpoint of the two anchors, for single-region scatters.
pub const CITY_CENTER: (f64, f64) = (18.624160, 73.835552);

/// Maximum offset from an anchor in degrees.
const SPREAD_DEG: f64 = 0.01;

/// `count` points, each near a randomly chosen region anchor.
pub fn two_region_locations(count: usize, seed: u64) -> Vec<(f64, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let (lat, lng) = if rng.gen_bool(0.5) {
                REGION_ANCHORS[0]
            } else {
                REGION_ANCHORS[1]
            };
            (
                lat + rng.gen_range(0.0..SPREAD_DEG),
                lng + rng.gen_range(0.0..SPREAD_DEG),
            )
        })
        .collect()
}

/// `count` points near the city center.
pub fn city_locations(count: usize, seed: u64) -> Vec<(f64, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (
                CITY_CENTER.0 + rng.gen_range(0.0..SPREAD_DEG),
                CITY_CENTER.1 + rng.gen_range(0.0..SPREAD_DEG),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_scatter() {
        assert_eq!(two_region_locations(20, 7), two_region_locations(20, 7));
        assert_ne!(two_region_locations(20, 7), two_region_locations(20, 8));
    }

    #[test]
    fn points_stay_near_an_anchor() {
        for (lat, lng) in two_region_locations(100, 3) {
            assert!(REGION_ANCHORS.iter().any(|&(a_lat, a_lng)| {
                (a_lat..a_lat + SPREAD_DEG).contains(&lat) && (a_lng..a_lng + SPREAD_DEG).contains(&lng)
            }));
        }
    }
}
