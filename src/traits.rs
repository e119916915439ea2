//! Core domain traits for the allocator.
//!
//! These are intentionally minimal and domain-agnostic. Concrete apps should
//! implement them for their own data models.

use std::hash::Hash;

use crate::cost::{CostMatrix, MatrixError};

/// Unique identifier for allocator entities.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// A capacity-constrained facility that serves drops.
pub trait Depot {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Location coordinates (lat, lng) in degrees.
    fn location(&self) -> (f64, f64);

    /// Maximum number of drops this depot may serve.
    fn capacity(&self) -> u32;
}

/// A demand point served by at most one depot.
pub trait DropPoint {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Location coordinates (lat, lng) in degrees.
    fn location(&self) -> (f64, f64);
}

/// Provides a depot × drop cost matrix in kilometers.
///
/// Row `d` corresponds to `depots[d]`, column `p` to `drops[p]`.
pub trait CostMatrixProvider {
    fn cost_matrix(
        &self,
        depots: &[(f64, f64)],
        drops: &[(f64, f64)],
    ) -> Result<CostMatrix, MatrixError>;
}
