//! OSRM HTTP adapter for road-distance cost matrices.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::cost::{CostMatrix, MatrixError};
use crate::traits::CostMatrixProvider;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Table URL with depots as sources and drops as destinations.
    fn table_url(&self, depots: &[(f64, f64)], drops: &[(f64, f64)]) -> String {
        let coords = depots
            .iter()
            .chain(drops)
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");
        let sources = index_list(0..depots.len());
        let destinations = index_list(depots.len()..depots.len() + drops.len());

        format!(
            "{}/table/v1/{}/{}?sources={}&destinations={}&annotations=distance",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords,
            sources,
            destinations
        )
    }
}

impl CostMatrixProvider for OsrmClient {
    fn cost_matrix(
        &self,
        depots: &[(f64, f64)],
        drops: &[(f64, f64)],
    ) -> Result<CostMatrix, MatrixError> {
        if depots.is_empty() || drops.is_empty() {
            return CostMatrix::empty(depots.len(), drops.len());
        }

        let url = self.table_url(depots, drops);
        debug!(
            depots = depots.len(),
            drops = drops.len(),
            url_len = url.len(),
            "requesting OSRM distance table"
        );

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())
            .inspect_err(|err| warn!("OSRM table request failed: {}", err))?;

        body.into_matrix(depots.len(), drops.len())
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    /// Meters; `null` where no route exists.
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    fn into_matrix(self, num_depots: usize, num_drops: usize) -> Result<CostMatrix, MatrixError> {
        if self.code != "Ok" {
            let detail = self.message.unwrap_or_default();
            warn!(code = %self.code, "OSRM rejected table request: {}", detail);
            return Err(MatrixError::Response(format!("{}: {}", self.code, detail)));
        }

        let distances = self
            .distances
            .ok_or_else(|| MatrixError::Response("missing distances annotation".to_string()))?;
        if distances.len() != num_depots {
            return Err(MatrixError::Response(format!(
                "expected {} source rows, got {}",
                num_depots,
                distances.len()
            )));
        }

        let rows = distances
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|meters| meters.map_or(f64::INFINITY, |m| m / 1000.0))
                    .collect()
            })
            .collect();
        let matrix = CostMatrix::from_rows(rows)?;
        if matrix.num_drops() != num_drops {
            return Err(MatrixError::Response(format!(
                "expected {} destination columns, got {}",
                num_drops,
                matrix.num_drops()
            )));
        }
        Ok(matrix)
    }
}

fn index_list(indices: std::ops::Range<usize>) -> String {
    indices
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(";")
}
