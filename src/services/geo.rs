//! Geographic calculations and the offline travel-time estimator

use serde::{Deserialize, Serialize};

use crate::defaults::{DEFAULT_MIN_TRAVEL_MINUTES, DEFAULT_SPEED_KMH};
use crate::error::{PlanError, PlanResult};
use crate::types::Coordinates;

/// Earth mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance and travel time for one leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    pub distance_km: f64,
    pub minutes: u32,
}

/// Strategy for estimating a single leg between two points
pub trait TravelEstimator: Send + Sync {
    fn estimate(&self, from: &Coordinates, to: &Coordinates) -> PlanResult<TravelEstimate>;

    /// Get estimator name for logging
    fn name(&self) -> &str;
}

/// Reject NaN and out-of-range coordinates
pub fn ensure_valid(point: &Coordinates) -> PlanResult<()> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(PlanError::InvalidCoordinate {
            lat: point.lat,
            lng: point.lng,
        })
    }
}

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    if from.same_place(to) {
        return 0.0;
    }

    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Haversine distance at an assumed average speed. Needs no network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaversineEstimator {
    /// Average urban speed in km/h
    pub speed_kmh: f64,
    /// Straight-line to road distance coefficient
    pub road_factor: f64,
    /// Lower bound for any leg, so no visit is ever zero travel
    pub min_minutes: u32,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
            road_factor: 1.0,
            min_minutes: DEFAULT_MIN_TRAVEL_MINUTES,
        }
    }
}

impl HaversineEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            speed_kmh,
            ..Self::default()
        }
    }

    /// Travel minutes for a road distance, rounded and floored at `min_minutes`
    pub fn minutes_for(&self, road_km: f64) -> u32 {
        let raw = (road_km / self.speed_kmh * 60.0).round();
        let minutes = if raw.is_finite() && raw > 0.0 { raw as u32 } else { 0 };
        minutes.max(self.min_minutes)
    }
}

impl TravelEstimator for HaversineEstimator {
    fn estimate(&self, from: &Coordinates, to: &Coordinates) -> PlanResult<TravelEstimate> {
        ensure_valid(from)?;
        ensure_valid(to)?;

        let distance_km = haversine_distance(from, to) * self.road_factor;
        Ok(TravelEstimate {
            distance_km,
            minutes: self.minutes_for(distance_km),
        })
    }

    fn name(&self) -> &str {
        "Haversine"
    }
}

/// Estimate every leg between `points`; `matrix[i][j]` is the leg i -> j.
pub fn estimate_matrix(
    estimator: &dyn TravelEstimator,
    points: &[Coordinates],
) -> PlanResult<Vec<Vec<TravelEstimate>>> {
    let n = points.len();
    let zero = TravelEstimate { distance_km: 0.0, minutes: 0 };
    let mut matrix = vec![vec![zero; n]; n];

    for i in 0..n {
        for j in 0..n {
            if i != j {
                matrix[i][j] = estimator.estimate(&points[i], &points[j])?;
            }
        }
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dubai_mall() -> Coordinates {
        Coordinates { lat: 25.1972, lng: 55.2796 }
    }

    fn abu_dhabi() -> Coordinates {
        Coordinates { lat: 24.4539, lng: 54.3773 }
    }

    #[test]
    fn test_haversine_prague_brno() {
        let prague = Coordinates { lat: 50.0755, lng: 14.4378 };
        let brno = Coordinates { lat: 49.1951, lng: 16.6068 };

        let distance = haversine_distance(&prague, &brno);

        // Prague to Brno is approximately 185 km
        assert!((distance - 185.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = dubai_mall();
        assert_eq!(haversine_distance(&point, &point), 0.0);
    }

    #[test]
    fn test_haversine_equivalent_points_are_zero() {
        let north_a = Coordinates { lat: 90.0, lng: 0.0 };
        let north_b = Coordinates { lat: 90.0, lng: 135.0 };
        assert_eq!(haversine_distance(&north_a, &north_b), 0.0);

        let south_a = Coordinates { lat: -90.0, lng: -45.0 };
        let south_b = Coordinates { lat: -90.0, lng: 180.0 };
        assert_eq!(haversine_distance(&south_a, &south_b), 0.0);

        let east = Coordinates { lat: 12.5, lng: 180.0 };
        let west = Coordinates { lat: 12.5, lng: -180.0 };
        assert_eq!(haversine_distance(&east, &west), 0.0);

        // Distinct points stay apart
        assert!(haversine_distance(&north_a, &south_a) > 20_000.0);
        let nudged = Coordinates { lat: 12.5, lng: 179.999 };
        assert!(haversine_distance(&east, &nudged) > 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = dubai_mall();
        let b = abu_dhabi();
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
        assert!(haversine_distance(&a, &b) > 100.0);
    }

    #[test]
    fn test_thirty_km_at_thirty_kmh_is_an_hour() {
        // 30 km due north along a meridian
        let from = Coordinates { lat: 25.0, lng: 55.0 };
        let delta_deg = (30.0 / EARTH_RADIUS_KM).to_degrees();
        let to = Coordinates { lat: 25.0 + delta_deg, lng: 55.0 };

        let estimate = HaversineEstimator::default().estimate(&from, &to).unwrap();

        assert!((estimate.distance_km - 30.0).abs() < 0.01, "got {} km", estimate.distance_km);
        assert!((59..=61).contains(&estimate.minutes), "got {} min", estimate.minutes);
    }

    #[test]
    fn test_coincident_points_get_minimum_travel() {
        let point = dubai_mall();
        let estimate = HaversineEstimator::default().estimate(&point, &point).unwrap();
        assert_eq!(estimate.distance_km, 0.0);
        assert_eq!(estimate.minutes, DEFAULT_MIN_TRAVEL_MINUTES);
    }

    #[test]
    fn test_speed_is_a_parameter() {
        let slow = HaversineEstimator::with_speed(15.0);
        let fast = HaversineEstimator::with_speed(60.0);
        let a = dubai_mall();
        let b = abu_dhabi();

        let slow_min = slow.estimate(&a, &b).unwrap().minutes;
        let fast_min = fast.estimate(&a, &b).unwrap().minutes;
        assert!(slow_min > fast_min * 3);
    }

    #[test]
    fn test_invalid_coordinate_is_an_error() {
        let bad = Coordinates { lat: 123.0, lng: 55.0 };
        let result = HaversineEstimator::default().estimate(&dubai_mall(), &bad);
        assert_eq!(result, Err(PlanError::InvalidCoordinate { lat: 123.0, lng: 55.0 }));

        let nan = Coordinates { lat: 25.0, lng: f64::NAN };
        assert!(HaversineEstimator::default().estimate(&nan, &dubai_mall()).is_err());
    }

    #[test]
    fn test_estimate_matrix() {
        let points = vec![
            Coordinates { lat: 25.0, lng: 55.0 },
            Coordinates { lat: 25.1, lng: 55.1 },
            Coordinates { lat: 25.2, lng: 55.2 },
        ];

        let matrix = estimate_matrix(&HaversineEstimator::default(), &points).unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0].len(), 3);

        // Diagonal should be zero
        for i in 0..3 {
            assert_eq!(matrix[i][i].distance_km, 0.0);
            assert_eq!(matrix[i][i].minutes, 0);
        }

        // Should be symmetric
        assert_eq!(matrix[0][1].distance_km, matrix[1][0].distance_km);
        assert_eq!(matrix[0][2].minutes, matrix[2][0].minutes);
    }
}
