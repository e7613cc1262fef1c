//! Route sequencing and ETA computation.
//!
//! Given any subset of outlets (a day's items, an inspector's items, an area,
//! a risk tier) this module orders the stops by risk, assigns 1-based
//! positions and walks the route from the depot computing arrival/departure
//! times. The order is NOT geometric; travel legs only feed the ETA chain.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use tracing::debug;

use super::allocator::{assign_windows, risk_order, AllocatorConfig};
use super::geo::{ensure_valid, HaversineEstimator, TravelEstimate, TravelEstimator};
use crate::error::PlanResult;
use crate::types::{Coordinates, Outlet, Route, RouteStop, RouteWarning, ScheduleDay, ScheduleItem, WorkingHours};

/// Per-request routing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    /// Keep only the N riskiest stops
    pub max_stops: Option<usize>,
    /// Departure from the depot
    pub departure: NaiveTime,
    pub working_hours: WorkingHours,
}

impl Default for RouteOptions {
    fn default() -> Self {
        let working_hours = WorkingHours::default();
        Self {
            max_stops: None,
            departure: working_hours.open,
            working_hours,
        }
    }
}

impl RouteOptions {
    pub fn capped(max_stops: usize) -> Self {
        Self {
            max_stops: Some(max_stops),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MINUTES_PER_DAY: u32 = 24 * 60;

fn minute_of(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

/// Risk-descending order, truncated to `max_stops`
pub fn order_items(items: &[ScheduleItem], max_stops: Option<usize>) -> Vec<ScheduleItem> {
    let mut ordered = items.to_vec();
    ordered.sort_by(|a, b| risk_order(a.risk_score, a.outlet_id, b.risk_score, b.outlet_id));
    if let Some(cap) = max_stops {
        ordered.truncate(cap);
    }
    ordered
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Walk already-ordered stops and compute ETAs.
///
/// `legs[i]` is the travel leg into stop `i` (from the depot for `i == 0`);
/// `return_leg` is the way back from the last stop.
pub fn chain_route(
    ordered: Vec<ScheduleItem>,
    legs: &[TravelEstimate],
    return_leg: Option<TravelEstimate>,
    date: NaiveDate,
    depot: Coordinates,
    options: &RouteOptions,
) -> Route {
    let mut route = Route::empty(date, depot, options.departure);
    let close = options.working_hours.close_minute();
    let start_of_day = date.and_time(NaiveTime::MIN);

    // Minutes since midnight of `date`; exceeds one day on very long routes
    let mut cursor = minute_of(options.departure);
    let mut total_distance_km = 0.0;
    let mut total_travel = 0u32;
    let mut total_service = 0u32;

    for (i, (item, leg)) in ordered.into_iter().zip(legs.iter()).enumerate() {
        let order = i as u32 + 1;
        let service = item.priority.service_minutes();
        let arrival = cursor + leg.minutes;
        let departure = arrival + service;
        let eta = start_of_day + Duration::minutes(arrival as i64);
        let etd = start_of_day + Duration::minutes(departure as i64);

        if departure >= MINUTES_PER_DAY {
            route.warnings.push(RouteWarning {
                stop_order: Some(order),
                warning_type: "past_midnight".to_string(),
                message: format!("Stop {} ends after midnight ({})", order, etd.format("%Y-%m-%d %H:%M")),
            });
        } else if departure > close {
            route.warnings.push(RouteWarning {
                stop_order: Some(order),
                warning_type: "overruns_working_day".to_string(),
                message: format!(
                    "Stop {} ({}) ends at {} after close {}",
                    order,
                    item.name,
                    etd.format("%H:%M"),
                    options.working_hours.close.format("%H:%M")
                ),
            });
        }

        route.stops.push(RouteStop {
            item,
            order,
            eta,
            etd,
            travel_minutes_from_prev: leg.minutes,
            distance_km_from_prev: leg.distance_km,
            service_minutes: service,
        });

        total_distance_km += leg.distance_km;
        total_travel += leg.minutes;
        total_service += service;
        cursor = departure;
    }

    if let (Some(back), false) = (return_leg, route.stops.is_empty()) {
        route.return_to_depot_distance_km = back.distance_km;
        route.return_to_depot_minutes = back.minutes;
        total_distance_km += back.distance_km;
        total_travel += back.minutes;
    }

    route.total_distance_km = total_distance_km;
    route.total_travel_minutes = total_travel;
    route.total_service_minutes = total_service;
    route
}

/// Orders stops and chains their ETAs with a pluggable travel estimator
pub struct Sequencer {
    estimator: Box<dyn TravelEstimator>,
    options: RouteOptions,
    slots: AllocatorConfig,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Box::new(HaversineEstimator::default()), RouteOptions::default())
    }
}

impl Sequencer {
    pub fn new(estimator: Box<dyn TravelEstimator>, options: RouteOptions) -> Self {
        Self {
            estimator,
            options,
            slots: AllocatorConfig::default(),
        }
    }

    /// Slot layout used when sequencing raw outlets
    pub fn with_slots(mut self, slots: AllocatorConfig) -> PlanResult<Self> {
        slots.validate()?;
        self.slots = slots;
        Ok(self)
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    /// Sequence an ad hoc outlet selection for `date`.
    pub fn sequence(&self, selection: &[Outlet], date: NaiveDate, depot: Coordinates) -> PlanResult<Route> {
        let refs: Vec<&Outlet> = selection.iter().collect();
        let (items, _) = assign_windows(&refs, date, &self.slots);
        self.sequence_items(&items, date, depot)
    }

    pub fn sequence_day(&self, day: &ScheduleDay, depot: Coordinates) -> PlanResult<Route> {
        self.sequence_items(&day.items, day.date, depot)
    }

    /// Sequence already scheduled items.
    pub fn sequence_items(&self, items: &[ScheduleItem], date: NaiveDate, depot: Coordinates) -> PlanResult<Route> {
        ensure_valid(&depot)?;

        let ordered = order_items(items, self.options.max_stops);
        let mut legs = Vec::with_capacity(ordered.len());
        let mut prev = depot;
        for item in &ordered {
            let here = item.coordinates();
            legs.push(self.estimator.estimate(&prev, &here)?);
            prev = here;
        }
        let return_leg = if ordered.is_empty() {
            None
        } else {
            Some(self.estimator.estimate(&prev, &depot)?)
        };

        debug!(
            "Sequenced {} of {} stops for {} using {}",
            ordered.len(),
            items.len(),
            date,
            self.estimator.name()
        );

        Ok(chain_route(ordered, &legs, return_leg, date, depot, &self.options))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
