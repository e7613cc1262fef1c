//! Schedule types

use chrono::{Datelike, Months, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::{Coordinates, Grade, Outlet, Priority};
use crate::error::{PlanError, PlanResult};

/// Inspector available for allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspector {
    pub id: String,
    pub name: String,
}

impl Inspector {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Inclusive date range spanning whole calendar months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `count` whole months starting at the first day of `year`-`month`.
    pub fn months(year: i32, month: u32, count: u32) -> PlanResult<Self> {
        if count == 0 {
            return Err(PlanError::configuration("date window must span at least one month"));
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            PlanError::configuration(format!("invalid window start {}-{:02}", year, month))
        })?;
        let end = start
            .checked_add_months(Months::new(count))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| PlanError::configuration("date window end out of range"))?;
        Ok(Self { start, end })
    }

    /// Rejects inverted ranges and ranges that do not start on the 1st / end on a month's last day.
    pub fn validate(&self) -> PlanResult<()> {
        if self.start > self.end {
            return Err(PlanError::configuration(format!(
                "date window is inverted: {} > {}",
                self.start, self.end
            )));
        }
        if self.start.day() != 1 {
            return Err(PlanError::configuration(format!(
                "date window must start on the first day of a month, got {}",
                self.start
            )));
        }
        let ends_month = self.end.succ_opt().map(|next| next.day() == 1).unwrap_or(true);
        if !ends_month {
            return Err(PlanError::configuration(format!(
                "date window must end on the last day of a month, got {}",
                self.end
            )));
        }
        Ok(())
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Clock-time window within a working day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// "HH:MM-HH:MM"
    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.end.num_seconds_from_midnight().saturating_sub(self.start.num_seconds_from_midnight())) / 60
    }
}

/// Working hours configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            open: crate::defaults::default_work_start(),
            close: crate::defaults::default_work_end(),
        }
    }
}

impl WorkingHours {
    pub fn open_minute(&self) -> u32 {
        self.open.num_seconds_from_midnight() / 60
    }

    pub fn close_minute(&self) -> u32 {
        self.close.num_seconds_from_midnight() / 60
    }

    pub fn available_minutes(&self) -> u32 {
        self.close_minute().saturating_sub(self.open_minute())
    }

    pub fn contains(&self, window: &TimeWindow) -> bool {
        self.open <= window.start && window.start < window.end && window.end <= self.close
    }
}

/// One outlet scheduled on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub outlet_id: u32,
    pub name: String,
    pub area: String,
    pub category: String,
    pub grade: Grade,
    pub risk_score: f64,
    pub forecast_volume: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    pub priority: Priority,
    pub scheduled_window: TimeWindow,
    pub calendar_uid: String,
}

impl ScheduleItem {
    pub fn new(outlet: &Outlet, date: NaiveDate, window: TimeWindow, uid_domain: &str) -> Self {
        Self {
            outlet_id: outlet.id,
            name: outlet.name.clone(),
            area: outlet.area.clone(),
            category: outlet.category.clone(),
            grade: outlet.grade,
            risk_score: outlet.risk_score,
            forecast_volume: outlet.forecast_volume,
            latitude: outlet.latitude,
            longitude: outlet.longitude,
            zone: outlet.zone.clone(),
            priority: outlet.priority(),
            scheduled_window: window,
            calendar_uid: calendar_uid(outlet.id, date, uid_domain),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn risk_percent(&self) -> f64 {
        (self.risk_score * 1000.0).round() / 10.0
    }

    pub fn zone_or_area(&self) -> &str {
        self.zone.as_deref().unwrap_or(&self.area)
    }
}

/// Stable calendar identifier for an (outlet, date) pair
pub fn calendar_uid(outlet_id: u32, date: NaiveDate, domain: &str) -> String {
    format!("outlet-{}-{}@{}", outlet_id, date.format("%Y%m%d"), domain)
}

/// One working day of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub inspector_id: String,
    pub inspector_name: String,
    pub items: Vec<ScheduleItem>,
}

/// Non-fatal conditions observed while allocating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ScheduleWarning {
    /// No outlet survived filtering; every day is empty.
    EmptyPool,
    /// The daily quota exceeds the pool, so days carry fewer items than requested.
    QuotaExceedsPool { pool_size: usize, daily_quota: usize },
    /// The quota does not fit the working day; trailing items share a clipped window.
    ClippedWindows { clipped_per_day: usize },
}

/// All schedule days for the planning window, sorted by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub period: DateRange,
    pub days: Vec<ScheduleDay>,
    #[serde(default)]
    pub warnings: Vec<ScheduleWarning>,
}

impl Schedule {
    pub fn item_count(&self) -> usize {
        self.days.iter().map(|d| d.items.len()).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = (&ScheduleDay, &ScheduleItem)> {
        self.days.iter().flat_map(|day| day.items.iter().map(move |item| (day, item)))
    }

    pub fn day(&self, date: NaiveDate) -> Option<&ScheduleDay> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_spans_whole_months() {
        let range = DateRange::months(2025, 11, 3).unwrap();
        assert_eq!(range.start, date(2025, 11, 1));
        assert_eq!(range.end, date(2026, 1, 31));
        assert!(range.validate().is_ok());
        assert_eq!(range.days().count(), 30 + 31 + 31);
    }

    #[test]
    fn test_months_rejects_zero_count() {
        assert!(matches!(DateRange::months(2025, 1, 0), Err(PlanError::Configuration(_))));
        assert!(matches!(DateRange::months(2025, 13, 1), Err(PlanError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_and_partial() {
        let inverted = DateRange { start: date(2025, 3, 1), end: date(2025, 2, 28) };
        assert!(inverted.validate().is_err());

        let mid_month = DateRange { start: date(2025, 3, 15), end: date(2025, 3, 31) };
        assert!(mid_month.validate().is_err());

        let short_end = DateRange { start: date(2025, 3, 1), end: date(2025, 3, 30) };
        assert!(short_end.validate().is_err());

        let leap = DateRange { start: date(2024, 2, 1), end: date(2024, 2, 29) };
        assert!(leap.validate().is_ok());
    }

    #[test]
    fn test_calendar_uid_format() {
        let uid = calendar_uid(42, date(2025, 1, 6), "planner.local");
        assert_eq!(uid, "outlet-42-20250106@planner.local");
    }

    #[test]
    fn test_time_window_label_and_duration() {
        let window = TimeWindow {
            start: NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
            end: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        };
        assert_eq!(window.label(), "08:45-09:15");
        assert_eq!(window.duration_minutes(), 30);
        assert!(WorkingHours::default().contains(&window));
    }
}
