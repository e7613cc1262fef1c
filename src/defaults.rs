//! Static planning defaults, overridable through configuration

use chrono::NaiveTime;

use crate::types::Coordinates;

pub const DEFAULT_DAILY_QUOTA: usize = 12;
pub const DEFAULT_SLOT_STRIDE_MINUTES: u32 = 45;
pub const DEFAULT_INSPECTION_MINUTES: u32 = 30;
pub const DEFAULT_SPEED_KMH: f64 = 30.0;
pub const DEFAULT_MIN_TRAVEL_MINUTES: u32 = 5;
pub const DEFAULT_PLANNING_MONTHS: u32 = 3;
pub const DEFAULT_UID_DOMAIN: &str = "inspection-planner";
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 4 * 60;

/// Dubai city center
pub const DEFAULT_DEPOT: Coordinates = Coordinates::new(25.2048, 55.2708);

pub fn default_work_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid static default work start")
}

pub fn default_work_end() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).expect("valid static default work end")
}
