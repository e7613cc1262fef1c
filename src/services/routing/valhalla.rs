//! Valhalla routing engine client
//!
//! Valhalla API documentation:
//! https://valhalla.github.io/valhalla/api/matrix/api-reference/

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DistanceTimeMatrices, RoutingService};
use crate::types::Coordinates;

/// Valhalla client configuration
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of Valhalla server (e.g., "http://localhost:8002")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Costing model; outlets are reached by car
    pub costing: String,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_seconds: 30,
            costing: "auto".to_string(),
        }
    }
}

impl ValhallaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}

/// Valhalla routing client
pub struct ValhallaClient {
    client: Client,
    config: ValhallaConfig,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Build the sources_to_targets request
    fn build_matrix_request(&self, locations: &[Coordinates]) -> MatrixRequest {
        let locs: Vec<ValhallaLocation> = locations
            .iter()
            .map(|c| ValhallaLocation {
                lat: c.lat,
                lon: c.lng,
                // Outlet coordinates are building centroids, often set back from the road
                radius: Some(200),
            })
            .collect();

        MatrixRequest {
            sources: locs.clone(),
            targets: locs,
            costing: self.config.costing.clone(),
            units: "kilometers".to_string(),
        }
    }
}

#[async_trait]
impl RoutingService for ValhallaClient {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
        let n = locations.len();

        if n == 0 {
            return Ok(DistanceTimeMatrices::empty());
        }

        if n == 1 {
            return Ok(DistanceTimeMatrices {
                distances: vec![vec![0]],
                durations: vec![vec![0]],
                size: 1,
            });
        }

        let request = self.build_matrix_request(locations);
        let url = format!("{}/sources_to_targets", self.config.base_url);

        debug!("Requesting distance matrix from Valhalla for {} locations", n);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Valhalla")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Valhalla returned error {}: {}", status, body);
        }

        let matrix_response: MatrixResponse = response
            .json()
            .await
            .context("Failed to parse Valhalla response")?;

        matrix_response.into_matrices(n)
    }

    fn name(&self) -> &str {
        "Valhalla"
    }
}

// Valhalla API types

#[derive(Debug, Serialize)]
struct MatrixRequest {
    sources: Vec<ValhallaLocation>,
    targets: Vec<ValhallaLocation>,
    costing: String,
    units: String,
}

#[derive(Debug, Serialize, Clone)]
struct ValhallaLocation {
    lat: f64,
    lon: f64,
    /// Snapping radius in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    /// Distance in kilometers (when units="kilometers")
    distance: Option<f64>,
    /// Time in seconds
    time: Option<f64>,
}

impl MatrixResponse {
    /// Unreachable pairs are an error
    fn into_matrices(self, n: usize) -> Result<DistanceTimeMatrices> {
        if self.sources_to_targets.len() != n {
            anyhow::bail!("Valhalla matrix has {} rows, expected {}", self.sources_to_targets.len(), n);
        }

        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];

        for (i, row) in self.sources_to_targets.into_iter().enumerate() {
            if row.len() != n {
                anyhow::bail!("Valhalla matrix row {} has {} cells, expected {}", i, row.len(), n);
            }
            for (j, cell) in row.into_iter().enumerate() {
                if i == j {
                    continue;
                }
                let (Some(km), Some(secs)) = (cell.distance, cell.time) else {
                    anyhow::bail!("Valhalla found no route from location {} to {}", i, j);
                };
                distances[i][j] = (km.max(0.0) * 1000.0).round() as u64;
                durations[i][j] = secs.max(0.0).round() as u64;
            }
        }

        debug!("Received distance matrix from Valhalla: {}x{}", n, n);

        Ok(DistanceTimeMatrices {
            distances,
            durations,
            size: n,
        })
    }
}
