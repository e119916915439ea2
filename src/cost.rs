//! Dense depot × drop cost matrix.

use std::fmt;

use serde::Serialize;

/// Row-major matrix of service costs in kilometers.
///
/// Rows are depots, columns are drops. A cell of `f64::INFINITY` marks a
/// pair that can never be served (e.g. unroutable by road).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostMatrix {
    num_depots: usize,
    num_drops: usize,
    cells: Vec<f64>,
}

impl CostMatrix {
    /// Wraps row-major cells; `cells.len()` must equal `num_depots * num_drops`.
    pub fn new(num_depots: usize, num_drops: usize, cells: Vec<f64>) -> Result<Self, MatrixError> {
        if cells.len() != num_depots * num_drops {
            return Err(MatrixError::Shape {
                expected: num_depots * num_drops,
                actual: cells.len(),
            });
        }
        Ok(Self {
            num_depots,
            num_drops,
            cells,
        })
    }

    /// Builds a matrix from one row per depot. All rows must have the same length.
    ///
    /// With no rows the matrix has zero depots and zero drops.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let num_depots = rows.len();
        let num_drops = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(num_depots * num_drops);
        for (depot, row) in rows.into_iter().enumerate() {
            if row.len() != num_drops {
                return Err(MatrixError::RaggedRow {
                    depot,
                    expected: num_drops,
                    actual: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            num_depots,
            num_drops,
            cells,
        })
    }

    /// A matrix with depots but no drops, or drops but no depots.
    ///
    /// Fails with [`MatrixError::Shape`] if both sides are non-empty.
    pub fn empty(num_depots: usize, num_drops: usize) -> Result<Self, MatrixError> {
        Self::new(num_depots, num_drops, Vec::new())
    }

    pub fn num_depots(&self) -> usize {
        self.num_depots
    }

    pub fn num_drops(&self) -> usize {
        self.num_drops
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cost of serving `drop` from `depot`.
    ///
    /// Panics if either index is out of range.
    pub fn get(&self, depot: usize, drop: usize) -> f64 {
        assert!(depot < self.num_depots && drop < self.num_drops);
        self.cells[depot * self.num_drops + drop]
    }

    pub fn row(&self, depot: usize) -> &[f64] {
        let start = depot * self.num_drops;
        &self.cells[start..start + self.num_drops]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.num_depots).map(move |depot| self.row(depot))
    }
}

#[derive(Debug)]
pub enum MatrixError {
    /// Flat cell count does not match the declared dimensions.
    Shape { expected: usize, actual: usize },
    /// A depot row has a different length than the first row.
    RaggedRow {
        depot: usize,
        expected: usize,
        actual: usize,
    },
    /// The routing service could not be reached or returned an HTTP error.
    Http(reqwest::Error),
    /// The routing service answered, but not with a usable table.
    Response(String),
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::Shape { expected, actual } => {
                write!(f, "cost matrix expects {expected} cells, got {actual}")
            }
            MatrixError::RaggedRow {
                depot,
                expected,
                actual,
            } => write!(
                f,
                "cost matrix row for depot {depot} has {actual} cells, expected {expected}"
            ),
            MatrixError::Http(err) => write!(f, "routing request failed: {err}"),
            MatrixError::Response(msg) => write!(f, "routing response unusable: {msg}"),
        }
    }
}

impl std::error::Error for MatrixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatrixError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MatrixError {
    fn from(err: reqwest::Error) -> Self {
        MatrixError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_is_row_major() {
        let matrix = CostMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .expect("rectangular rows");

        assert_eq!(matrix.num_depots(), 2);
        assert_eq!(matrix.num_drops(), 3);
        assert_eq!(matrix.get(1, 0), 4.0);
        assert_eq!(matrix.row(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = CostMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            MatrixError::RaggedRow {
                depot: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = CostMatrix::new(2, 2, vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, MatrixError::Shape { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_rows_of_drop_less_matrix() {
        let matrix = CostMatrix::empty(3, 0).expect("no drops");
        let rows: Vec<&[f64]> = matrix.rows().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.is_empty()));
    }

    #[test]
    fn test_rows_of_depot_less_matrix() {
        let matrix = CostMatrix::empty(0, 4).expect("no depots");
        assert_eq!(matrix.rows().count(), 0);
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_empty_with_both_sides_rejected() {
        let err = CostMatrix::empty(2, 3).unwrap_err();
        assert!(matches!(err, MatrixError::Shape { expected: 6, actual: 0 }));
    }
}
