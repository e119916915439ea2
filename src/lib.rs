//! depot-allocator core
//!
//! Capacitated assignment of delivery drops to depots: great-circle (or road)
//! cost matrices and a time-limited MIP solve with an unassigned penalty.

pub mod traits;
pub mod cost;
pub mod haversine;
pub mod osrm;
pub mod optimizer;
pub mod sites;
pub mod planner;
