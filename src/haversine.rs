//! Haversine cost matrix provider.
//!
//! Uses great-circle distance between depots and drops. Ignores roads but
//! needs no external service.

use rayon::prelude::*;
use tracing::trace;

use crate::cost::{CostMatrix, MatrixError};
use crate::traits::CostMatrixProvider;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Above this many cells the matrix is built row-parallel.
const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Haversine-based cost matrix provider.
#[derive(Debug, Clone)]
pub struct HaversineCost {
    /// Cell count from which rows are computed on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for HaversineCost {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl HaversineCost {
    pub fn new(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Builds the depot × drop distance matrix.
    ///
    /// NaN coordinates yield NaN cells; nothing here validates input.
    pub fn build(&self, depots: &[(f64, f64)], drops: &[(f64, f64)]) -> CostMatrix {
        let cells = depots.len() * drops.len();
        let row = |depot: &(f64, f64)| -> Vec<f64> {
            drops.iter().map(|drop| haversine_km(*depot, *drop)).collect()
        };

        let flat: Vec<f64> = if cells > self.parallel_threshold {
            trace!(cells, "building haversine matrix in parallel");
            depots.par_iter().flat_map_iter(row).collect()
        } else {
            depots.iter().flat_map(row).collect()
        };

        CostMatrix::new(depots.len(), drops.len(), flat)
            .unwrap_or_else(|_| unreachable!("one cell per depot/drop pair"))
    }
}

impl CostMatrixProvider for HaversineCost {
    fn cost_matrix(
        &self,
        depots: &[(f64, f64)],
        drops: &[(f64, f64)],
    ) -> Result<CostMatrix, MatrixError> {
        Ok(self.build(depots, drops))
    }
}

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
