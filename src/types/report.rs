//! Report payloads handed to the surrounding application

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Coordinates, Route, RouteStop, RouteWarning, ScheduleDay, ScheduleWarning};

/// Per-area aggregate with the geographic centroid of its outlets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub area: String,
    /// Distinct outlets scheduled in this area
    pub outlet_count: usize,
    /// Scheduled visits, repeats included
    pub visit_count: usize,
    pub centroid: Coordinates,
    pub mean_risk: f64,
    pub total_forecast_volume: f64,
    pub high_priority_count: usize,
}

/// Per-zone outlet count and volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBreakdown {
    pub zone: String,
    pub outlet_count: usize,
    pub total_forecast_volume: f64,
}

/// Pointer to the calendar file generated for a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarExportRef {
    pub file_name: String,
    pub event_count: usize,
    pub rejected_count: usize,
}

/// Schedule output document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub days: Vec<ScheduleDay>,
    pub area_summaries: Vec<AreaSummary>,
    pub zone_breakdown: Vec<ZoneBreakdown>,
    pub calendar_export: CalendarExportRef,
    #[serde(default)]
    pub warnings: Vec<ScheduleWarning>,
}

/// Route output document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    pub date: NaiveDate,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_name: Option<String>,
    pub depot: Coordinates,
    pub departure: NaiveTime,
    pub stops: Vec<RouteStop>,
    pub total_distance_km: f64,
    pub total_travel_minutes: u32,
    pub total_service_minutes: u32,
    pub return_to_depot_distance_km: f64,
    pub return_to_depot_minutes: u32,
    pub warnings: Vec<RouteWarning>,
}

impl RouteReport {
    pub fn new(route: Route, label: impl Into<String>, inspector: Option<(&str, &str)>) -> Self {
        Self {
            date: route.date,
            label: label.into(),
            inspector_id: inspector.map(|(id, _)| id.to_string()),
            inspector_name: inspector.map(|(_, name)| name.to_string()),
            depot: route.depot,
            departure: route.departure,
            stops: route.stops,
            total_distance_km: route.total_distance_km,
            total_travel_minutes: route.total_travel_minutes,
            total_service_minutes: route.total_service_minutes,
            return_to_depot_distance_km: route.return_to_depot_distance_km,
            return_to_depot_minutes: route.return_to_depot_minutes,
            warnings: route.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_report_carries_inspector() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let route = Route::empty(date, Coordinates::new(25.2, 55.3), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let report = RouteReport::new(route, "Inspector INS-1", Some(("INS-1", "Inspector One")));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["inspector_id"], "INS-1");
        assert_eq!(json["label"], "Inspector INS-1");
        assert_eq!(json["stops"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_route_report_omits_missing_inspector() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let route = Route::empty(date, Coordinates::new(0.0, 0.0), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let json = serde_json::to_value(RouteReport::new(route, "Area Marina", None)).unwrap();
        assert!(json.get("inspector_id").is_none());
    }
}
