//! Capacitated depot/drop allocation as a mixed-integer program.
//!
//! One boolean `x[d,p]` per depot/drop pair, a capacity row per depot, an
//! at-most-one row per drop, and an objective that charges the service cost
//! of every assignment plus a fixed penalty for every drop left unserved.
//! The model is handed to HiGHS under a wall-clock limit.

use std::fmt;
use std::time::Duration;

use highs::{Col, HighsModelStatus, RowProblem, Sense};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cost::CostMatrix;

/// Cost charged for each drop that no depot serves.
pub const DEFAULT_UNASSIGNED_PENALTY: f64 = 500.0;

/// Wall-clock budget for a single solve.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

/// Solver values above this are read as 1.
const ASSIGNED_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Objective cost of leaving one drop unassigned. Should exceed any
    /// plausible service distance so abandonment is a last resort.
    pub unassigned_penalty: f64,
    /// Wall-clock limit handed to the solver.
    pub time_limit: Duration,
    /// Relative MIP gap at which the solver may stop; solver default if `None`.
    pub mip_rel_gap: Option<f64>,
    /// Let HiGHS print its own log to stdout.
    pub solver_output: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            unassigned_penalty: DEFAULT_UNASSIGNED_PENALTY,
            time_limit: DEFAULT_TIME_LIMIT,
            mip_rel_gap: None,
            solver_output: false,
        }
    }
}

/// How the solver terminated for a successful allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Best incumbent when a limit stopped the search.
    Feasible,
}

/// Drops served by one depot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepotAllocation {
    pub depot: usize,
    pub drops: Vec<usize>,
}

/// Depot → drops mapping extracted from a solved model.
///
/// Only depots with at least one drop appear. Entries follow the order in
/// which depots first received a drop; callers should not rely on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    entries: Vec<DepotAllocation>,
    unassigned: Vec<usize>,
    status: SolveStatus,
    objective: f64,
}

impl Allocation {
    pub fn entries(&self) -> &[DepotAllocation] {
        &self.entries
    }

    /// Drops assigned to `depot`, or `None` if it serves nothing.
    pub fn get(&self, depot: usize) -> Option<&[usize]> {
        self.entries
            .iter()
            .find(|entry| entry.depot == depot)
            .map(|entry| entry.drops.as_slice())
    }

    /// Drops no depot serves, in index order.
    pub fn unassigned(&self) -> &[usize] {
        &self.unassigned
    }

    pub fn assigned_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.drops.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Service cost of the assignment plus the penalty for every unassigned drop.
    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// Why the solver produced nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSolutionReason {
    /// The model was proven infeasible.
    Infeasible,
    /// A limit was reached before any feasible solution was found.
    NoIncumbent,
}

#[derive(Debug)]
pub enum OptimizeError {
    /// `capacities` has a different length than the matrix has depots.
    CapacityCountMismatch { depots: usize, capacities: usize },
    /// A cost cell is NaN or negative infinity.
    NonFiniteCost { depot: usize, drop: usize, value: f64 },
    /// An option value the solver cannot use.
    InvalidOption(String),
    /// HiGHS failed internally; fatal for this call.
    Solver(String),
    /// The solve finished without an optimal or feasible assignment.
    NoSolution(NoSolutionReason),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::CapacityCountMismatch { depots, capacities } => write!(
                f,
                "{capacities} capacities supplied for {depots} depots"
            ),
            OptimizeError::NonFiniteCost { depot, drop, value } => write!(
                f,
                "cost from depot {depot} to drop {drop} is {value}"
            ),
            OptimizeError::InvalidOption(msg) => write!(f, "invalid option: {msg}"),
            OptimizeError::Solver(msg) => write!(f, "solver failure: {msg}"),
            OptimizeError::NoSolution(NoSolutionReason::Infeasible) => {
                write!(f, "no solution found: model is infeasible")
            }
            OptimizeError::NoSolution(NoSolutionReason::NoIncumbent) => {
                write!(f, "no solution found within the time limit")
            }
        }
    }
}

impl std::error::Error for OptimizeError {}

/// Assign drops to depots minimizing service cost plus unassigned penalties.
///
/// `costs` is depots × drops, `capacities[d]` bounds the drops depot `d`
/// may serve. A cost of `f64::INFINITY` forbids that pair.
pub fn optimize(
    costs: &CostMatrix,
    capacities: &[u32],
    options: &OptimizeOptions,
) -> Result<Allocation, OptimizeError> {
    validate(costs, capacities, options)?;

    let num_depots = costs.num_depots();
    let num_drops = costs.num_drops();
    info!(num_depots, num_drops, "optimizing allocation");

    if num_depots == 0 || num_drops == 0 {
        debug!("nothing to assign, skipping solver");
        return Ok(Allocation {
            entries: Vec::new(),
            unassigned: (0..num_drops).collect(),
            status: SolveStatus::Optimal,
            objective: options.unassigned_penalty * num_drops as f64,
        });
    }

    let (problem, columns) = build_model(costs, capacities, options.unassigned_penalty);

    let mut model = problem.optimise(Sense::Minimise);
    model.set_option("output_flag", options.solver_output);
    model.set_option("time_limit", options.time_limit.as_secs_f64());
    if let Some(gap) = options.mip_rel_gap {
        model.set_option("mip_rel_gap", gap);
    }

    let solved = model
        .try_solve()
        .map_err(|status| OptimizeError::Solver(format!("HiGHS run returned {:?}", status)))?;
    let model_status = solved.status();
    debug!(status = ?model_status, "solver finished");

    let values = solved.get_solution().columns().to_vec();
    let status = classify(
        model_status,
        solved.objective_value(),
        &values,
        &columns,
        capacities,
    )
    .inspect_err(|err| warn!(status = ?model_status, "{}", err))?;

    let allocation = extract(costs, &columns, &values, status, options.unassigned_penalty);
    info!(
        status = ?allocation.status,
        objective = allocation.objective,
        assigned = allocation.assigned_count(),
        unassigned = allocation.unassigned.len(),
        "allocation complete"
    );
    Ok(allocation)
}

/// Maps a HiGHS termination onto success or a no-solution outcome.
///
/// Limit-type stops (time, iterations, ...) count as `Feasible` only with a
/// finite objective and a complete assignment that satisfies every row.
fn classify(
    status: HighsModelStatus,
    objective: f64,
    values: &[f64],
    columns: &Columns,
    capacities: &[u32],
) -> Result<SolveStatus, OptimizeError> {
    let solve_status = match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => SolveStatus::Optimal,
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            return Err(OptimizeError::NoSolution(NoSolutionReason::Infeasible));
        }
        HighsModelStatus::LoadError
        | HighsModelStatus::ModelError
        | HighsModelStatus::PresolveError
        | HighsModelStatus::SolveError
        | HighsModelStatus::PostsolveError => {
            return Err(OptimizeError::Solver(format!("{:?}", status)));
        }
        // Binary columns are bounded, so this is a solver malfunction.
        HighsModelStatus::Unbounded => {
            return Err(OptimizeError::Solver(format!("{:?}", status)));
        }
        _ => SolveStatus::Feasible,
    };

    if values.len() != columns.cols.len() {
        return Err(OptimizeError::Solver(format!(
            "expected {} column values, got {}",
            columns.cols.len(),
            values.len()
        )));
    }
    if solve_status == SolveStatus::Feasible
        && !(objective.is_finite() && is_incumbent(values, columns, capacities))
    {
        return Err(OptimizeError::NoSolution(NoSolutionReason::NoIncumbent));
    }
    Ok(solve_status)
}

fn validate(
    costs: &CostMatrix,
    capacities: &[u32],
    options: &OptimizeOptions,
) -> Result<(), OptimizeError> {
    if capacities.len() != costs.num_depots() {
        return Err(OptimizeError::CapacityCountMismatch {
            depots: costs.num_depots(),
            capacities: capacities.len(),
        });
    }
    if !options.unassigned_penalty.is_finite() || options.unassigned_penalty < 0.0 {
        return Err(OptimizeError::InvalidOption(format!(
            "unassigned_penalty must be finite and non-negative, got {}",
            options.unassigned_penalty
        )));
    }
    if options.time_limit.is_zero() {
        return Err(OptimizeError::InvalidOption("time_limit must be positive".to_string()));
    }
    if let Some(gap) = options.mip_rel_gap {
        if !(gap.is_finite() && gap >= 0.0) {
            return Err(OptimizeError::InvalidOption(format!(
                "mip_rel_gap must be finite and non-negative, got {}",
                gap
            )));
        }
    }
    for (depot, row) in costs.rows().enumerate() {
        if let Some((drop, &value)) = row
            .iter()
            .enumerate()
            .find(|(_, value)| value.is_nan() || **value == f64::NEG_INFINITY)
        {
            return Err(OptimizeError::NonFiniteCost { depot, drop, value });
        }
    }
    Ok(())
}

/// Decision columns in depot-major order: `columns[d * num_drops + p]` is `x[d,p]`.
struct Columns {
    num_drops: usize,
    cols: Vec<Col>,
}

impl Columns {
    fn index(&self, depot: usize, drop: usize) -> usize {
        depot * self.num_drops + drop
    }
}

fn build_model(costs: &CostMatrix, capacities: &[u32], penalty: f64) -> (RowProblem, Columns) {
    let num_depots = costs.num_depots();
    let num_drops = costs.num_drops();
    let mut problem = RowProblem::new();

    // penalty * (1 - sum_d x[d,p]) contributes -penalty to every x[d,p];
    // the constant num_drops * penalty is added back in `extract`.
    let mut cols = Vec::with_capacity(num_depots * num_drops);
    for row in costs.rows() {
        for &cost in row {
            let col = if cost.is_finite() {
                problem.add_integer_column(cost - penalty, 0.0..=1.0)
            } else {
                problem.add_integer_column(0.0, 0.0..=0.0)
            };
            cols.push(col);
        }
    }
    let columns = Columns { num_drops, cols };

    for (depot, &capacity) in capacities.iter().enumerate() {
        let terms: Vec<(Col, f64)> = (0..num_drops)
            .map(|drop| (columns.cols[columns.index(depot, drop)], 1.0))
            .collect();
        problem.add_row(..=f64::from(capacity), terms);
    }

    for drop in 0..num_drops {
        let terms: Vec<(Col, f64)> = (0..num_depots)
            .map(|depot| (columns.cols[columns.index(depot, drop)], 1.0))
            .collect();
        problem.add_row(..=1.0, terms);
    }

    debug!(
        variables = columns.cols.len(),
        constraints = num_depots + num_drops,
        "model built"
    );
    (problem, columns)
}

/// Whether `values` is a complete assignment that respects every row.
fn is_incumbent(values: &[f64], columns: &Columns, capacities: &[u32]) -> bool {
    if values.len() != columns.cols.len() {
        return false;
    }
    let num_drops = columns.num_drops;
    let mut served = vec![0u32; num_drops];
    for (depot, &capacity) in capacities.iter().enumerate() {
        let mut load = 0u32;
        for (drop, count) in served.iter_mut().enumerate() {
            if values[columns.index(depot, drop)] > ASSIGNED_THRESHOLD {
                load += 1;
                *count += 1;
            }
        }
        if load > capacity {
            return false;
        }
    }
    served.iter().all(|&count| count <= 1)
}

fn extract(
    costs: &CostMatrix,
    columns: &Columns,
    values: &[f64],
    status: SolveStatus,
    penalty: f64,
) -> Allocation {
    let num_drops = costs.num_drops();
    let mut entries: Vec<DepotAllocation> = Vec::new();
    let mut served = vec![false; num_drops];
    let mut objective = 0.0;

    for depot in 0..costs.num_depots() {
        for drop in 0..num_drops {
            if values[columns.index(depot, drop)] <= ASSIGNED_THRESHOLD {
                continue;
            }
            objective += costs.get(depot, drop);
            served[drop] = true;
            match entries.iter_mut().find(|entry| entry.depot == depot) {
                Some(entry) => entry.drops.push(drop),
                None => entries.push(DepotAllocation {
                    depot,
                    drops: vec![drop],
                }),
            }
        }
    }

    let unassigned: Vec<usize> = (0..num_drops).filter(|&drop| !served[drop]).collect();
    objective += penalty * unassigned.len() as f64;

    Allocation {
        entries,
        unassigned,
        status,
        objective,
    }
}
