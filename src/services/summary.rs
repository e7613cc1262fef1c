//! Per-area and per-zone aggregates over a schedule

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{AreaSummary, CalendarExportRef, Coordinates, Priority, Schedule, ScheduleReport, ZoneBreakdown};

#[derive(Default)]
struct AreaAcc {
    outlets: HashSet<u32>,
    visits: usize,
    lat_sum: f64,
    lng_sum: f64,
    risk_sum: f64,
    volume: f64,
    high: usize,
}

/// One summary per area, sorted by area name.
///
/// Centroid, mean risk, volume and high-priority count are over distinct
/// outlets; `visit_count` counts every scheduled visit.
pub fn area_summaries(schedule: &Schedule) -> Vec<AreaSummary> {
    let mut areas: BTreeMap<&str, AreaAcc> = BTreeMap::new();

    for (_, item) in schedule.items() {
        let acc = areas.entry(item.area.as_str()).or_default();
        acc.visits += 1;
        if acc.outlets.insert(item.outlet_id) {
            acc.lat_sum += item.latitude;
            acc.lng_sum += item.longitude;
            acc.risk_sum += item.risk_score;
            acc.volume += item.forecast_volume;
            if item.priority == Priority::High {
                acc.high += 1;
            }
        }
    }

    areas
        .into_iter()
        .map(|(area, acc)| {
            let n = acc.outlets.len().max(1) as f64;
            AreaSummary {
                area: area.to_string(),
                outlet_count: acc.outlets.len(),
                visit_count: acc.visits,
                centroid: Coordinates::new(acc.lat_sum / n, acc.lng_sum / n),
                mean_risk: acc.risk_sum / n,
                total_forecast_volume: acc.volume,
                high_priority_count: acc.high,
            }
        })
        .collect()
}

/// Distinct outlets and their forecast volume per zone, sorted by zone name
pub fn zone_breakdown(schedule: &Schedule) -> Vec<ZoneBreakdown> {
    let mut zones: BTreeMap<&str, (HashSet<u32>, f64)> = BTreeMap::new();

    for (_, item) in schedule.items() {
        let (outlets, volume) = zones.entry(item.zone_or_area()).or_default();
        if outlets.insert(item.outlet_id) {
            *volume += item.forecast_volume;
        }
    }

    zones
        .into_iter()
        .map(|(zone, (outlets, volume))| ZoneBreakdown {
            zone: zone.to_string(),
            outlet_count: outlets.len(),
            total_forecast_volume: volume,
        })
        .collect()
}

/// Assemble the schedule report. Run id and generation time are supplied by the caller.
pub fn schedule_report(
    schedule: &Schedule,
    calendar_export: CalendarExportRef,
    run_id: Uuid,
    generated_at: DateTime<Utc>,
) -> ScheduleReport {
    ScheduleReport {
        period_start: schedule.period.start,
        period_end: schedule.period.end,
        run_id,
        generated_at,
        days: schedule.days.clone(),
        area_summaries: area_summaries(schedule),
        zone_breakdown: zone_breakdown(schedule),
        calendar_export,
        warnings: schedule.warnings.clone(),
    }
}
