//! Eligibility filters for the outlet pool and route selections over a schedule

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Grade, Outlet, Priority, Schedule, ScheduleItem};

/// Eligibility predicate applied before allocation. Empty filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutletFilter {
    pub category: Option<String>,
    pub area: Option<String>,
    /// Inclusive lower bound on risk score
    pub min_risk: Option<f64>,
    #[serde(default)]
    pub grades: Vec<Grade>,
    /// Keep at most this many outlets (after the other filters)
    pub limit: Option<usize>,
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl OutletFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, outlet: &Outlet) -> bool {
        self.category.as_deref().map_or(true, |c| same_label(c, &outlet.category))
            && self.area.as_deref().map_or(true, |a| same_label(a, &outlet.area))
            && self.min_risk.map_or(true, |min| outlet.risk_score >= min)
            && (self.grades.is_empty() || self.grades.contains(&outlet.grade))
    }

    /// Matching outlets in input order
    pub fn apply(&self, outlets: &[Outlet]) -> Vec<Outlet> {
        let limit = self.limit.unwrap_or(usize::MAX);
        let eligible: Vec<Outlet> = outlets
            .iter()
            .filter(|o| self.matches(o))
            .take(limit)
            .cloned()
            .collect();
        debug!("Eligibility filter kept {} of {} outlets", eligible.len(), outlets.len());
        eligible
    }
}

/// Which scheduled items a route is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "value")]
pub enum RouteSelection {
    Day(NaiveDate),
    Inspector(String),
    Area(String),
    Tier(Priority),
}

impl RouteSelection {
    pub fn label(&self) -> String {
        match self {
            RouteSelection::Day(date) => format!("Day {}", date),
            RouteSelection::Inspector(id) => format!("Inspector {}", id),
            RouteSelection::Area(area) => format!("Area {}", area),
            RouteSelection::Tier(priority) => format!("{} priority", priority.as_str()),
        }
    }

    fn includes(&self, inspector_id: &str, date: NaiveDate, item: &ScheduleItem) -> bool {
        match self {
            RouteSelection::Day(d) => *d == date,
            RouteSelection::Inspector(id) => id == inspector_id,
            RouteSelection::Area(area) => same_label(area, &item.area),
            RouteSelection::Tier(priority) => *priority == item.priority,
        }
    }

    /// Selected items in schedule order; each outlet only once (first visit wins)
    pub fn items(&self, schedule: &Schedule) -> Vec<ScheduleItem> {
        let mut seen = HashSet::new();
        schedule
            .items()
            .filter(|(day, item)| self.includes(&day.inspector_id, day.date, item))
            .filter(|(_, item)| seen.insert(item.outlet_id))
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Inspector (id, name) the selection belongs to, if any
    pub fn inspector<'a>(&self, schedule: &'a Schedule) -> Option<(&'a str, &'a str)> {
        let day = match self {
            RouteSelection::Day(date) => schedule.day(*date),
            RouteSelection::Inspector(id) => schedule.days.iter().find(|d| &d.inspector_id == id),
            _ => None,
        }?;
        Some((day.inspector_id.as_str(), day.inspector_name.as_str()))
    }

    /// Date the route is planned for: the day itself, else the first matching day
    pub fn route_date(&self, schedule: &Schedule) -> Option<NaiveDate> {
        match self {
            RouteSelection::Day(date) => Some(*date),
            _ => schedule
                .items()
                .find(|(day, item)| self.includes(&day.inspector_id, day.date, item))
                .map(|(day, _)| day.date),
        }
    }
}
