//! Plain depot/drop records for callers without their own domain types.
//!
//! Fills in what bare coordinate lists lack: zero-based ids and a uniform
//! default capacity.

use serde::{Deserialize, Serialize};

use crate::traits::{Depot, DropPoint, Id};

/// Capacity given to every depot when none is supplied.
pub const DEFAULT_DEPOT_CAPACITY: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotSite<I> {
    pub id: I,
    pub location: (f64, f64),
    pub capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSite<I> {
    pub id: I,
    pub location: (f64, f64),
}

impl<I: Id> Depot for DepotSite<I> {
    type Id = I;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn location(&self) -> (f64, f64) {
        self.location
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl<I: Id> DropPoint for DropSite<I> {
    type Id = I;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn location(&self) -> (f64, f64) {
        self.location
    }
}

/// Depots identified by position. Without `capacities` each depot gets
/// [`DEFAULT_DEPOT_CAPACITY`].
///
/// Returns `None` if `capacities` is given with a different length.
pub fn depot_sites(
    locations: &[(f64, f64)],
    capacities: Option<&[u32]>,
) -> Option<Vec<DepotSite<usize>>> {
    if capacities.is_some_and(|caps| caps.len() != locations.len()) {
        return None;
    }
    let sites = locations
        .iter()
        .enumerate()
        .map(|(id, &location)| DepotSite {
            id,
            location,
            capacity: capacities.map_or(DEFAULT_DEPOT_CAPACITY, |caps| caps[id]),
        })
        .collect();
    Some(sites)
}

/// Drops identified by position.
pub fn drop_sites(locations: &[(f64, f64)]) -> Vec<DropSite<usize>> {
    locations
        .iter()
        .enumerate()
        .map(|(id, &location)| DropSite { id, location })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity_and_ids() {
        let sites = depot_sites(&[(18.62, 73.81), (18.62, 73.86)], None).expect("no capacities");
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[1].id, 1);
        assert!(sites.iter().all(|site| site.capacity == DEFAULT_DEPOT_CAPACITY));
    }

    #[test]
    fn test_explicit_capacities() {
        let sites = depot_sites(&[(18.62, 73.81), (18.62, 73.86)], Some(&[3, 0])).expect("matching");
        assert_eq!(sites[0].capacity(), 3);
        assert_eq!(sites[1].capacity(), 0);
    }

    #[test]
    fn test_capacity_length_mismatch() {
        assert!(depot_sites(&[(18.62, 73.81)], Some(&[1, 2])).is_none());
    }

    #[test]
    fn test_drop_sites_keep_order() {
        let drops = drop_sites(&[(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(drops[0].id, 0);
        assert_eq!(drops[1].location(), (3.0, 4.0));
    }
}
