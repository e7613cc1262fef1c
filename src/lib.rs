//! Inspection Planner - schedule and route synthesis for outlet inspections
//!
//! Builds a multi-month inspection calendar from an outlet pool, orders a
//! day's visits into a timed route from a depot, and exports schedules as
//! iCalendar and CSV.

pub mod config;
pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use error::{PlanError, PlanResult};
