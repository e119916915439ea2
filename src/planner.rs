//! Allocation planner: domain records in, presentation-ready plan out.
//!
//! Builds the cost matrix through a [`CostMatrixProvider`], runs the
//! optimizer and maps solver indices back to caller ids and locations.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::cost::MatrixError;
use crate::optimizer::{optimize, OptimizeError, OptimizeOptions, SolveStatus};
use crate::traits::{CostMatrixProvider, Depot, DropPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropPlan<DropId> {
    pub drop_id: DropId,
    pub drop_location: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepotPlan<DepotId, DropId> {
    pub depot_id: DepotId,
    pub depot_location: (f64, f64),
    pub depot_capacity: u32,
    pub drops: Vec<DropPlan<DropId>>,
}

/// Allocation keyed by caller ids. Depots serving nothing are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan<DepotId, DropId> {
    pub depots: Vec<DepotPlan<DepotId, DropId>>,
    pub unassigned: Vec<DropPlan<DropId>>,
    pub status: SolveStatus,
    pub objective: f64,
}

impl<DepotId: PartialEq, DropId> AllocationPlan<DepotId, DropId> {
    pub fn depot(&self, id: &DepotId) -> Option<&DepotPlan<DepotId, DropId>> {
        self.depots.iter().find(|plan| &plan.depot_id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Depot,
    Drop,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Depot => write!(f, "depot"),
            Side::Drop => write!(f, "drop"),
        }
    }
}

#[derive(Debug)]
pub enum PlanError {
    /// Latitude/longitude not finite or out of range.
    InvalidCoordinate {
        side: Side,
        index: usize,
        location: (f64, f64),
    },
    /// The provider returned a matrix that is not depots × drops.
    MatrixDimensions {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    Matrix(MatrixError),
    Optimize(OptimizeError),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::InvalidCoordinate {
                side,
                index,
                location,
            } => write!(f, "{side} {index} has invalid coordinate {location:?}"),
            PlanError::MatrixDimensions { expected, actual } => write!(
                f,
                "cost matrix is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            PlanError::Matrix(err) => write!(f, "{err}"),
            PlanError::Optimize(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::InvalidCoordinate { .. } | PlanError::MatrixDimensions { .. } => None,
            PlanError::Matrix(err) => Some(err),
            PlanError::Optimize(err) => Some(err),
        }
    }
}

impl From<MatrixError> for PlanError {
    fn from(err: MatrixError) -> Self {
        PlanError::Matrix(err)
    }
}

impl From<OptimizeError> for PlanError {
    fn from(err: OptimizeError) -> Self {
        PlanError::Optimize(err)
    }
}

/// Allocate `drops` to `depots` and return the plan keyed by their ids.
pub fn plan<D, P, M>(
    depots: &[D],
    drops: &[P],
    provider: &M,
    options: &OptimizeOptions,
) -> Result<AllocationPlan<D::Id, P::Id>, PlanError>
where
    D: Depot,
    P: DropPoint,
    M: CostMatrixProvider,
{
    let depot_locations: Vec<(f64, f64)> = depots.iter().map(Depot::location).collect();
    let drop_locations: Vec<(f64, f64)> = drops.iter().map(DropPoint::location).collect();
    check_coordinates(Side::Depot, &depot_locations)?;
    check_coordinates(Side::Drop, &drop_locations)?;

    let capacities: Vec<u32> = depots.iter().map(Depot::capacity).collect();
    let costs = provider.cost_matrix(&depot_locations, &drop_locations)?;
    let expected = (depots.len(), drops.len());
    let actual = (costs.num_depots(), costs.num_drops());
    if actual != expected {
        return Err(PlanError::MatrixDimensions { expected, actual });
    }
    let allocation = optimize(&costs, &capacities, options)?;

    let drop_plan = |index: usize| DropPlan {
        drop_id: drops[index].id().clone(),
        drop_location: drop_locations[index],
    };

    let depot_plans = allocation
        .entries()
        .iter()
        .map(|entry| {
            let depot = &depots[entry.depot];
            DepotPlan {
                depot_id: depot.id().clone(),
                depot_location: depot_locations[entry.depot],
                depot_capacity: depot.capacity(),
                drops: entry.drops.iter().map(|&index| drop_plan(index)).collect(),
            }
        })
        .collect();
    let unassigned = allocation
        .unassigned()
        .iter()
        .map(|&index| drop_plan(index))
        .collect();

    debug!(depots_used = allocation.entries().len(), "plan formatted");
    Ok(AllocationPlan {
        depots: depot_plans,
        unassigned,
        status: allocation.status(),
        objective: allocation.objective(),
    })
}

fn check_coordinates(side: Side, locations: &[(f64, f64)]) -> Result<(), PlanError> {
    let invalid = locations.iter().position(|&(lat, lng)| {
        !(lat.is_finite() && lng.is_finite())
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
    });
    match invalid {
        Some(index) => Err(PlanError::InvalidCoordinate {
            side,
            index,
            location: locations[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineCost;
    use crate::sites::{depot_sites, drop_sites};

    #[test]
    fn test_plan_maps_indices_to_ids() {
        let depots = depot_sites(&[(18.62, 73.81), (18.62, 73.86)], Some(&[1, 1])).expect("sites");
        let drops = drop_sites(&[(18.621, 73.861), (18.621, 73.811)]);

        let plan = plan(&depots, &drops, &HaversineCost::default(), &OptimizeOptions::default())
            .expect("solvable");

        assert_eq!(plan.depot(&0).map(|d| d.drops[0].drop_id), Some(1));
        assert_eq!(plan.depot(&1).map(|d| d.drops[0].drop_id), Some(0));
        assert_eq!(plan.depot(&1).map(|d| d.depot_capacity), Some(1));
        assert!(plan.unassigned.is_empty());
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let depots = depot_sites(&[(18.62, 73.81)], None).expect("sites");
        let drops = drop_sites(&[(18.62, 73.81), (f64::NAN, 73.8)]);

        let err = plan(&depots, &drops, &HaversineCost::default(), &OptimizeOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::InvalidCoordinate {
                side: Side::Drop,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_latitude_out_of_range_rejected() {
        let depots = depot_sites(&[(91.0, 73.81)], None).expect("sites");
        let err = plan(&depots, &drop_sites(&[]), &HaversineCost::default(), &OptimizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidCoordinate { side: Side::Depot, .. }));
    }
}
