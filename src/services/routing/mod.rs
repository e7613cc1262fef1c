//! Routing strategies for travel matrices
//!
//! Haversine is always available offline; Valhalla is an optional precise
//! backend selected by configuration.

mod valhalla;

pub use valhalla::{ValhallaClient, ValhallaConfig};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::geo::{ensure_valid, estimate_matrix, HaversineEstimator, TravelEstimate};
use super::sequencer::{chain_route, order_items, RouteOptions};
use crate::defaults::DEFAULT_MIN_TRAVEL_MINUTES;
use crate::error::{PlanError, PlanResult};
use crate::types::{Coordinates, Route, ScheduleItem};

/// Distance and time matrices between locations
#[derive(Debug, Clone)]
pub struct DistanceTimeMatrices {
    /// Distance in meters [i][j] from location i to location j
    pub distances: Vec<Vec<u64>>,
    /// Duration in seconds [i][j] from location i to location j
    pub durations: Vec<Vec<u64>>,
    /// Number of locations
    pub size: usize,
}

impl DistanceTimeMatrices {
    /// Create empty matrices
    pub fn empty() -> Self {
        Self {
            distances: vec![],
            durations: vec![],
            size: 0,
        }
    }

    /// Get distance from location i to location j in meters
    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.distances[from][to]
    }

    /// Get duration from location i to location j in seconds
    pub fn duration(&self, from: usize, to: usize) -> u64 {
        self.durations[from][to]
    }

    /// Both matrices must be `n` x `n` with every row filled
    pub fn ensure_square(&self, n: usize) -> std::result::Result<(), String> {
        if self.size != n || self.distances.len() != n || self.durations.len() != n {
            return Err(format!(
                "returned {} distance / {} duration rows (size {}) for {} locations",
                self.distances.len(),
                self.durations.len(),
                self.size,
                n
            ));
        }
        let ragged = self
            .distances
            .iter()
            .zip(&self.durations)
            .position(|(d, t)| d.len() != n || t.len() != n);
        match ragged {
            Some(row) => Err(format!("returned a short row {} for {} locations", row, n)),
            None => Ok(()),
        }
    }

    /// Leg i -> j in minutes (rounded up), never below `min_minutes`
    pub fn leg(&self, from: usize, to: usize, min_minutes: u32) -> TravelEstimate {
        let minutes = (self.duration(from, to) as f64 / 60.0).ceil() as u32;
        TravelEstimate {
            distance_km: self.distance(from, to) as f64 / 1000.0,
            minutes: minutes.max(min_minutes),
        }
    }
}

/// Routing service trait for abstraction (Valhalla, haversine)
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Get distance and time matrices for a list of locations
    /// First location is the depot
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Offline routing backed by [`HaversineEstimator`]
#[derive(Debug, Clone, Default)]
pub struct HaversineRouting {
    estimator: HaversineEstimator,
}

impl HaversineRouting {
    pub fn new(estimator: HaversineEstimator) -> Self {
        Self { estimator }
    }
}

#[async_trait]
impl RoutingService for HaversineRouting {
    async fn get_matrices(&self, locations: &[Coordinates]) -> Result<DistanceTimeMatrices> {
        let n = locations.len();
        if n == 0 {
            return Ok(DistanceTimeMatrices::empty());
        }

        let legs = estimate_matrix(&self.estimator, locations)?;
        let distances = legs
            .iter()
            .map(|row| row.iter().map(|leg| (leg.distance_km * 1000.0).round() as u64).collect())
            .collect();
        let durations = legs
            .iter()
            .map(|row| row.iter().map(|leg| leg.minutes as u64 * 60).collect())
            .collect();

        Ok(DistanceTimeMatrices {
            distances,
            durations,
            size: n,
        })
    }

    fn name(&self) -> &str {
        "Haversine"
    }
}

/// Create routing service with automatic Valhalla detection and fallback
///
/// Tries Valhalla if a URL is provided. Falls back to haversine if Valhalla
/// is unavailable or not configured.
pub async fn create_routing_service_with_fallback(
    valhalla_url: Option<String>,
    fallback: HaversineEstimator,
) -> Box<dyn RoutingService> {
    if let Some(url) = valhalla_url {
        match check_valhalla_health(&url).await {
            Ok(()) => match ValhallaClient::new(ValhallaConfig::new(&url)) {
                Ok(client) => {
                    info!("Valhalla routing service available at {}", url);
                    return Box::new(client);
                }
                Err(e) => warn!("Cannot build Valhalla client for {}: {}", url, e),
            },
            Err(e) => {
                warn!("Valhalla not available at {}: {}. Falling back to haversine routing.", url, e);
            }
        }
    }

    info!("Using haversine routing (Valhalla not configured or unavailable)");
    Box::new(HaversineRouting::new(fallback))
}

/// Check if Valhalla is healthy by making a simple status request
async fn check_valhalla_health(base_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    let url = format!("{}/status", base_url);
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("Valhalla returned status {}", response.status())
    }
}

/// Sequence items with travel legs taken from a routing service matrix.
///
/// Stop order is the same risk order as the offline sequencer; only the legs differ.
pub async fn sequence_with_routing(
    service: &dyn RoutingService,
    items: &[ScheduleItem],
    date: NaiveDate,
    depot: Coordinates,
    options: &RouteOptions,
) -> PlanResult<Route> {
    ensure_valid(&depot)?;
    let ordered = order_items(items, options.max_stops);
    if ordered.is_empty() {
        return Ok(Route::empty(date, depot, options.departure));
    }

    let mut locations = Vec::with_capacity(ordered.len() + 1);
    locations.push(depot);
    for item in &ordered {
        let point = item.coordinates();
        ensure_valid(&point)?;
        locations.push(point);
    }

    let matrices = service
        .get_matrices(&locations)
        .await
        .map_err(|e| PlanError::Routing(format!("{}: {}", service.name(), e)))?;
    matrices
        .ensure_square(locations.len())
        .map_err(|reason| PlanError::Routing(format!("{} {}", service.name(), reason)))?;

    let legs: Vec<TravelEstimate> = (1..locations.len())
        .map(|i| matrices.leg(i - 1, i, DEFAULT_MIN_TRAVEL_MINUTES))
        .collect();
    let return_leg = matrices.leg(locations.len() - 1, 0, DEFAULT_MIN_TRAVEL_MINUTES);

    debug!("Sequenced {} stops for {} via {}", ordered.len(), date, service.name());

    Ok(chain_route(ordered, &legs, Some(return_leg), date, depot, options))
}
