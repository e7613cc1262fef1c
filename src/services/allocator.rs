//! Deterministic calendar allocation of outlets to inspectors.
//!
//! Walks every date of the planning window, skips rest days, and gives each
//! working day one inspector (round-robin) plus a contiguous slice of the
//! eligible pool. The slice for working day `d` starts at
//! `d * daily_quota mod pool_size`, where `d` counts working days only, so
//! consecutive working days walk the pool end to end before any outlet
//! repeats. No randomness is involved: the same inputs always yield the same
//! schedule.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use tracing::{debug, info, warn};

use crate::defaults::{DEFAULT_INSPECTION_MINUTES, DEFAULT_SLOT_STRIDE_MINUTES, DEFAULT_UID_DOMAIN};
use crate::error::{PlanError, PlanResult};
use crate::types::{
    DateRange, Inspector, Outlet, Schedule, ScheduleDay, ScheduleItem, ScheduleWarning, TimeWindow,
    WorkingHours,
};

/// Which dates inspections happen on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWeek {
    pub rest_days: Vec<Weekday>,
    /// Individual closures (public holidays etc.)
    pub closed_dates: Vec<NaiveDate>,
}

impl Default for WorkWeek {
    fn default() -> Self {
        Self {
            rest_days: vec![Weekday::Sat, Weekday::Sun],
            closed_dates: vec![],
        }
    }
}

impl WorkWeek {
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.rest_days.contains(&date.weekday()) && !self.closed_dates.contains(&date)
    }
}

/// Per-stop slot layout inside a working day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    /// Minutes between consecutive slot starts
    pub stride_minutes: u32,
    /// Inspection length; always shorter than the stride to leave travel slack
    pub inspection_minutes: u32,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            stride_minutes: DEFAULT_SLOT_STRIDE_MINUTES,
            inspection_minutes: DEFAULT_INSPECTION_MINUTES,
        }
    }
}

impl SlotPolicy {
    /// Shrink the preferred layout until `quota` slots fit between open and close.
    ///
    /// Once the stride bottoms out at two minutes the remaining items are
    /// clipped by [`SlotPolicy::window`] instead.
    pub fn fitted(preferred: SlotPolicy, hours: &WorkingHours, quota: usize) -> Self {
        let available = hours.available_minutes().max(2);
        let quota = (quota.max(1)).min(u32::MAX as usize) as u32;

        let mut stride = preferred.stride_minutes.max(2);
        let mut inspection = preferred.inspection_minutes.max(1);

        if stride.saturating_mul(quota) > available {
            stride = (available / quota).max(2);
            inspection = inspection.min(stride * 2 / 3);
        }
        inspection = inspection.min(stride - 1).min(available).max(1);

        Self {
            stride_minutes: stride,
            inspection_minutes: inspection,
        }
    }

    /// Window for the `k`-th stop of the day; clipped to close when it would overflow.
    pub fn window(&self, hours: &WorkingHours, k: usize) -> (TimeWindow, bool) {
        let open = hours.open_minute();
        let close = hours.close_minute();
        let offset = (k as u64).saturating_mul(self.stride_minutes as u64);
        let start = (open as u64).saturating_add(offset);
        let end = start + self.inspection_minutes as u64;

        if end <= close as u64 {
            (TimeWindow { start: clock(start as u32), end: clock(end as u32) }, false)
        } else {
            let start = close.saturating_sub(self.inspection_minutes).max(open);
            (TimeWindow { start: clock(start), end: clock(close) }, true)
        }
    }
}

/// Static allocation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub work_week: WorkWeek,
    pub working_hours: WorkingHours,
    pub slots: SlotPolicy,
    /// Domain suffix of generated calendar UIDs
    pub uid_domain: String,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            work_week: WorkWeek::default(),
            working_hours: WorkingHours::default(),
            slots: SlotPolicy::default(),
            uid_domain: DEFAULT_UID_DOMAIN.to_string(),
        }
    }
}

impl AllocatorConfig {
    /// Working hours must open before they close and UIDs need a domain.
    pub fn validate(&self) -> PlanResult<()> {
        if self.working_hours.open >= self.working_hours.close {
            return Err(PlanError::configuration(format!(
                "working hours are inverted: {} >= {}",
                self.working_hours.open, self.working_hours.close
            )));
        }
        if self.uid_domain.trim().is_empty() {
            return Err(PlanError::configuration("calendar UID domain is empty"));
        }
        Ok(())
    }
}

fn clock(minute_of_day: u32) -> NaiveTime {
    let clamped = minute_of_day.min(24 * 60 - 1);
    NaiveTime::from_hms_opt(clamped / 60, clamped % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Risk descending, then id ascending
pub fn risk_order(a_risk: f64, a_id: u32, b_risk: f64, b_id: u32) -> Ordering {
    b_risk.total_cmp(&a_risk).then(a_id.cmp(&b_id))
}

/// Pool indices for one working day, in walk order
pub fn daily_selection(pool_size: usize, daily_quota: usize, working_day_index: usize) -> Vec<usize> {
    if pool_size == 0 {
        return vec![];
    }
    let offset = ((working_day_index % pool_size) * (daily_quota % pool_size)) % pool_size;
    let take = daily_quota.min(pool_size);
    (0..take).map(|i| (offset + i) % pool_size).collect()
}

/// Give a date's outlets their slots, riskiest first.
///
/// Returns the items plus the number of windows that had to be clipped.
pub fn assign_windows(
    outlets: &[&Outlet],
    date: NaiveDate,
    config: &AllocatorConfig,
) -> (Vec<ScheduleItem>, usize) {
    let mut ordered: Vec<&Outlet> = outlets.to_vec();
    ordered.sort_by(|a, b| risk_order(a.risk_score, a.id, b.risk_score, b.id));

    let policy = SlotPolicy::fitted(config.slots, &config.working_hours, ordered.len());
    let mut clipped = 0;

    let items = ordered
        .iter()
        .enumerate()
        .map(|(k, outlet)| {
            let (window, was_clipped) = policy.window(&config.working_hours, k);
            if was_clipped {
                clipped += 1;
            }
            ScheduleItem::new(outlet, date, window, &config.uid_domain)
        })
        .collect();

    (items, clipped)
}

fn validate(
    window: &DateRange,
    inspectors: &[Inspector],
    daily_quota: usize,
    config: &AllocatorConfig,
) -> PlanResult<()> {
    if inspectors.is_empty() {
        return Err(PlanError::configuration("inspector list is empty"));
    }
    if daily_quota == 0 {
        return Err(PlanError::configuration("daily quota must be positive"));
    }
    window.validate()?;
    config.validate()
}

/// Build the schedule for `window`.
///
/// `outlets` must already be filtered to the eligible pool; its order is the
/// rotation order.
pub fn allocate(
    outlets: &[Outlet],
    window: &DateRange,
    inspectors: &[Inspector],
    daily_quota: usize,
    config: &AllocatorConfig,
) -> PlanResult<Schedule> {
    validate(window, inspectors, daily_quota, config)?;

    let pool_size = outlets.len();
    let mut warnings = Vec::new();

    if pool_size == 0 {
        warn!("Eligible outlet pool is empty; every day of {}..{} stays empty", window.start, window.end);
        warnings.push(ScheduleWarning::EmptyPool);
    } else if daily_quota > pool_size {
        warn!("Daily quota {} exceeds pool of {} outlets", daily_quota, pool_size);
        warnings.push(ScheduleWarning::QuotaExceedsPool { pool_size, daily_quota });
    }

    info!(
        "Allocating {} outlets to {} inspectors over {}..{} (quota {}/day)",
        pool_size,
        inspectors.len(),
        window.start,
        window.end,
        daily_quota
    );

    let mut days = Vec::new();
    let mut working_day_index = 0usize;
    let mut clipped_per_day = 0usize;

    for date in window.days() {
        if !config.work_week.is_working_day(date) {
            continue;
        }

        let inspector = &inspectors[working_day_index % inspectors.len()];
        let selected: Vec<&Outlet> = daily_selection(pool_size, daily_quota, working_day_index)
            .into_iter()
            .map(|idx| &outlets[idx])
            .collect();

        let (items, clipped) = assign_windows(&selected, date, config);
        clipped_per_day = clipped_per_day.max(clipped);

        debug!("{}: {} stops for {}", date, items.len(), inspector.id);

        days.push(ScheduleDay {
            date,
            inspector_id: inspector.id.clone(),
            inspector_name: inspector.name.clone(),
            items,
        });
        working_day_index += 1;
    }

    if clipped_per_day > 0 {
        warn!("{} stops per day do not fit the working day and share the closing window", clipped_per_day);
        warnings.push(ScheduleWarning::ClippedWindows { clipped_per_day });
    }

    info!("Allocated {} working days", days.len());

    Ok(Schedule {
        period: *window,
        days,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::types::Grade;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn outlet(id: u32, risk: f64) -> Outlet {
        Outlet {
            id,
            name: format!("Outlet {}", id),
            area: if id % 2 == 0 { "Deira".into() } else { "Jumeirah".into() },
            category: "Restaurant".into(),
            grade: Grade::B,
            risk_score: risk,
            forecast_volume: 10.0 * id as f64,
            latitude: 25.0 + id as f64 * 0.01,
            longitude: 55.0 + id as f64 * 0.01,
            zone: None,
        }
    }

    /// Ids 0..n with risk decreasing in id, so risk order equals pool order.
    fn pool(n: u32) -> Vec<Outlet> {
        (0..n).map(|i| outlet(i, 1.0 - i as f64 / (n as f64 + 1.0))).collect()
    }

    fn inspectors(n: usize) -> Vec<Inspector> {
        (1..=n).map(|i| Inspector::new(format!("INS-{}", i), format!("Inspector {}", i))).collect()
    }

    fn ids(day: &ScheduleDay) -> Vec<u32> {
        day.items.iter().map(|i| i.outlet_id).collect()
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    #[test]
    fn rotation_example_26_outlets_quota_12() {
        let window = DateRange::months(2025, 1, 3).unwrap();
        let schedule = allocate(&pool(26), &window, &inspectors(2), 12, &AllocatorConfig::default()).unwrap();

        // January 2025 starts on a Wednesday
        assert_eq!(schedule.days[0].date, date(2025, 1, 1));
        assert_eq!(ids(&schedule.days[0]), (0..12).collect::<Vec<_>>());
        assert_eq!(ids(&schedule.days[1]), (12..24).collect::<Vec<_>>());

        let mut day3: Vec<u32> = ids(&schedule.days[2]);
        day3.sort();
        let mut expected: Vec<u32> = vec![24, 25];
        expected.extend(0..10);
        expected.sort();
        assert_eq!(day3, expected);

        let seen: HashSet<u32> = schedule.days[..3].iter().flat_map(ids).collect();
        assert_eq!(seen.len(), 26);
    }

    #[test]
    fn walk_order_never_repeats_before_pool_is_exhausted() {
        for (pool_size, quota) in [(26, 12), (7, 3), (10, 10), (5, 8), (31, 4), (1, 1)] {
            let mut seen = HashSet::new();
            let mut exhausted = false;
            let rotation = (pool_size + quota - 1) / quota;
            for day in 0..rotation * 3 {
                for idx in daily_selection(pool_size, quota, day) {
                    if !seen.insert(idx) {
                        assert!(exhausted, "pool {} quota {}: {} repeated early", pool_size, quota, idx);
                    }
                    if seen.len() == pool_size {
                        exhausted = true;
                    }
                }
                if day + 1 == rotation {
                    assert_eq!(seen.len(), pool_size, "pool {} quota {} not covered", pool_size, quota);
                }
            }
        }
    }

    #[test]
    fn no_duplicates_within_a_day() {
        for day in 0..20 {
            let selection = daily_selection(5, 8, day);
            let unique: HashSet<_> = selection.iter().collect();
            assert_eq!(selection.len(), 5);
            assert_eq!(unique.len(), 5);
        }
    }

    #[test]
    fn weekends_do_not_advance_rotation() {
        let window = DateRange::months(2025, 1, 1).unwrap();
        let schedule = allocate(&pool(26), &window, &inspectors(1), 12, &AllocatorConfig::default()).unwrap();

        // Fri 3 Jan, then Mon 6 Jan continues the walk
        assert_eq!(schedule.days[2].date, date(2025, 1, 3));
        assert_eq!(schedule.days[3].date, date(2025, 1, 6));
        let mut monday = ids(&schedule.days[3]);
        monday.sort();
        assert_eq!(monday, (10..22).collect::<Vec<_>>());
    }

    // -----------------------------------------------------------------------
    // Calendar shape
    // -----------------------------------------------------------------------

    #[test]
    fn skips_weekends_and_closed_dates() {
        let window = DateRange::months(2025, 2, 1).unwrap();
        let mut config = AllocatorConfig::default();
        config.work_week.closed_dates.push(date(2025, 2, 14));

        let schedule = allocate(&pool(10), &window, &inspectors(3), 4, &config).unwrap();

        // February 2025 has 20 weekdays
        assert_eq!(schedule.days.len(), 19);
        for day in &schedule.days {
            assert!(!matches!(day.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert_ne!(day.date, date(2025, 2, 14));
        }
    }

    #[test]
    fn configurable_rest_days() {
        let window = DateRange::months(2025, 2, 1).unwrap();
        let mut config = AllocatorConfig::default();
        config.work_week.rest_days = vec![Weekday::Fri];

        let schedule = allocate(&pool(10), &window, &inspectors(1), 4, &config).unwrap();
        assert_eq!(schedule.days.len(), 28 - 4);
        assert!(schedule.days.iter().all(|d| d.date.weekday() != Weekday::Fri));
    }

    #[test]
    fn inspectors_rotate_round_robin() {
        let window = DateRange::months(2025, 3, 3).unwrap();
        let crew = inspectors(3);
        let schedule = allocate(&pool(40), &window, &crew, 10, &AllocatorConfig::default()).unwrap();

        for (i, day) in schedule.days.iter().enumerate() {
            assert_eq!(day.inspector_id, crew[i % 3].id);
        }
        for pair in schedule.days.windows(2) {
            assert_ne!(pair[0].inspector_id, pair[1].inspector_id);
        }
    }

    #[test]
    fn days_sorted_by_date() {
        let window = DateRange::months(2025, 11, 3).unwrap();
        let schedule = allocate(&pool(15), &window, &inspectors(2), 5, &AllocatorConfig::default()).unwrap();
        for pair in schedule.days.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        assert_eq!(schedule.period, window);
    }

    // -----------------------------------------------------------------------
    // Ordering and windows
    // -----------------------------------------------------------------------

    #[test]
    fn items_sorted_by_risk_then_id() {
        let outlets = vec![outlet(5, 0.3), outlet(2, 0.9), outlet(9, 0.9), outlet(1, 0.5)];
        let window = DateRange::months(2025, 1, 1).unwrap();
        let schedule = allocate(&outlets, &window, &inspectors(1), 4, &AllocatorConfig::default()).unwrap();

        assert_eq!(ids(&schedule.days[0]), vec![2, 9, 1, 5]);
    }

    #[test]
    fn windows_inside_working_day_and_increasing() {
        let window = DateRange::months(2025, 1, 3).unwrap();
        let config = AllocatorConfig::default();
        let schedule = allocate(&pool(26), &window, &inspectors(2), 12, &config).unwrap();

        for day in &schedule.days {
            for item in &day.items {
                let w = item.scheduled_window;
                assert!(hm(8, 0) <= w.start && w.start < w.end && w.end <= hm(20, 0));
            }
            for pair in day.items.windows(2) {
                assert!(pair[0].scheduled_window.end <= pair[1].scheduled_window.start);
            }
        }

        let first = &schedule.days[0].items;
        assert_eq!(first[0].scheduled_window.start, hm(8, 0));
        assert_eq!(first[0].scheduled_window.end, hm(8, 30));
        assert_eq!(first[1].scheduled_window.start, hm(8, 45));
    }

    #[test]
    fn large_quota_shrinks_stride() {
        let policy = SlotPolicy::fitted(SlotPolicy::default(), &WorkingHours::default(), 30);
        // 720 minutes / 30 stops
        assert_eq!(policy.stride_minutes, 24);
        assert!(policy.inspection_minutes < policy.stride_minutes);

        let window = DateRange::months(2025, 1, 1).unwrap();
        let schedule = allocate(&pool(60), &window, &inspectors(1), 30, &AllocatorConfig::default()).unwrap();
        assert!(schedule.warnings.is_empty());
        for pair in schedule.days[0].items.windows(2) {
            assert!(pair[0].scheduled_window.end <= pair[1].scheduled_window.start);
        }
    }

    #[test]
    fn overflowing_items_are_clipped_to_close() {
        let config = AllocatorConfig::default();
        let outlets = pool(400);
        let refs: Vec<&Outlet> = outlets.iter().collect();
        let (items, clipped) = assign_windows(&refs, date(2025, 1, 6), &config);

        assert!(clipped > 0);
        for item in &items {
            assert!(config.working_hours.contains(&item.scheduled_window));
        }
        assert_eq!(items.last().unwrap().scheduled_window.end, hm(20, 0));
    }

    // -----------------------------------------------------------------------
    // Determinism and failure modes
    // -----------------------------------------------------------------------

    #[test]
    fn allocation_is_deterministic() {
        let window = DateRange::months(2025, 4, 3).unwrap();
        let a = allocate(&pool(33), &window, &inspectors(4), 7, &AllocatorConfig::default()).unwrap();
        let b = allocate(&pool(33), &window, &inspectors(4), 7, &AllocatorConfig::default()).unwrap();

        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn calendar_uids_unique() {
        let window = DateRange::months(2025, 1, 3).unwrap();
        let schedule = allocate(&pool(26), &window, &inspectors(2), 12, &AllocatorConfig::default()).unwrap();
        let uids: HashSet<&str> = schedule.items().map(|(_, i)| i.calendar_uid.as_str()).collect();
        assert_eq!(uids.len(), schedule.item_count());
    }

    #[test]
    fn empty_pool_yields_empty_days() {
        let window = DateRange::months(2025, 1, 1).unwrap();
        let schedule = allocate(&[], &window, &inspectors(2), 12, &AllocatorConfig::default()).unwrap();

        assert_eq!(schedule.days.len(), 23);
        assert!(schedule.days.iter().all(|d| d.items.is_empty()));
        assert_eq!(schedule.warnings, vec![ScheduleWarning::EmptyPool]);
    }

    #[test]
    fn quota_larger_than_pool_warns() {
        let window = DateRange::months(2025, 1, 1).unwrap();
        let schedule = allocate(&pool(3), &window, &inspectors(1), 5, &AllocatorConfig::default()).unwrap();
        assert!(schedule.days.iter().all(|d| d.items.len() == 3));
        assert!(schedule
            .warnings
            .contains(&ScheduleWarning::QuotaExceedsPool { pool_size: 3, daily_quota: 5 }));
    }

    #[test]
    fn configuration_errors() {
        let window = DateRange::months(2025, 1, 1).unwrap();
        let config = AllocatorConfig::default();

        assert!(matches!(allocate(&pool(3), &window, &[], 2, &config), Err(PlanError::Configuration(_))));
        assert!(matches!(
            allocate(&pool(3), &window, &inspectors(1), 0, &config),
            Err(PlanError::Configuration(_))
        ));

        let inverted = DateRange { start: date(2025, 2, 1), end: date(2025, 1, 31) };
        assert!(matches!(
            allocate(&pool(3), &inverted, &inspectors(1), 2, &config),
            Err(PlanError::Configuration(_))
        ));

        let mut bad_hours = AllocatorConfig::default();
        bad_hours.working_hours = WorkingHours { open: hm(18, 0), close: hm(8, 0) };
        assert!(matches!(
            allocate(&pool(3), &window, &inspectors(1), 2, &bad_hours),
            Err(PlanError::Configuration(_))
        ));
    }
}
