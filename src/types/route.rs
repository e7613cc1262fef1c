//! Route types

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Coordinates, ScheduleItem};

/// A stop on the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    #[serde(flatten)]
    pub item: ScheduleItem,
    /// Order in route (1-based)
    pub order: u32,
    /// Estimated arrival; carries the date so routes running past midnight stay ordered
    pub eta: NaiveDateTime,
    /// Estimated departure
    pub etd: NaiveDateTime,
    pub travel_minutes_from_prev: u32,
    pub distance_km_from_prev: f64,
    pub service_minutes: u32,
}

/// Warning about route issues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteWarning {
    pub stop_order: Option<u32>,
    pub warning_type: String,
    pub message: String,
}

/// Ordered stops for one inspector/day/selection, starting at the depot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub date: NaiveDate,
    pub depot: Coordinates,
    pub departure: NaiveTime,
    pub stops: Vec<RouteStop>,
    pub total_distance_km: f64,
    /// Travel time only, including the return leg
    pub total_travel_minutes: u32,
    pub total_service_minutes: u32,
    pub return_to_depot_distance_km: f64,
    pub return_to_depot_minutes: u32,
    #[serde(default)]
    pub warnings: Vec<RouteWarning>,
}

impl Route {
    pub fn empty(date: NaiveDate, depot: Coordinates, departure: NaiveTime) -> Self {
        Self {
            date,
            depot,
            departure,
            stops: vec![],
            total_distance_km: 0.0,
            total_travel_minutes: 0,
            total_service_minutes: 0,
            return_to_depot_distance_km: 0.0,
            return_to_depot_minutes: 0,
            warnings: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
