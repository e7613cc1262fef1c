//! Configuration management

use anyhow::{self, Context, Result};
use chrono::FixedOffset;

use crate::defaults::{
    DEFAULT_DAILY_QUOTA, DEFAULT_DEPOT, DEFAULT_SPEED_KMH, DEFAULT_UTC_OFFSET_MINUTES,
};
use crate::types::{Coordinates, Inspector};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for the rolling log file
    pub logs_dir: String,

    /// Valhalla routing engine URL (optional, falls back to haversine if unavailable)
    pub valhalla_url: Option<String>,

    /// Route start and end point
    pub depot: Coordinates,

    pub daily_quota: usize,

    /// Average road speed used by the haversine estimator
    pub speed_kmh: f64,

    /// Offset of local working hours from UTC, in minutes
    pub utc_offset_minutes: i32,

    /// Inspector rotation, in order
    pub inspectors: Vec<Inspector>,

    /// Outlet category to plan for (all categories if unset)
    pub category: Option<String>,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_opt(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", name, raw)),
        None => Ok(default),
    }
}

/// Parse `id:name,id:name`. An entry without a name uses its id.
pub fn parse_inspectors(raw: &str) -> Result<Vec<Inspector>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = entry.split_once(':').unwrap_or((entry, entry));
            let (id, name) = (id.trim(), name.trim());
            if id.is_empty() {
                anyhow::bail!("inspector entry '{}' has an empty id", entry);
            }
            Ok(Inspector::new(id, if name.is_empty() { id } else { name }))
        })
        .collect()
}

fn default_inspectors() -> Vec<Inspector> {
    vec![Inspector::new("INS-1", "Inspector 1"), Inspector::new("INS-2", "Inspector 2")]
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let logs_dir = env_opt("LOGS_DIR").unwrap_or_else(|| "./logs".to_string());

        let valhalla_url = env_opt("VALHALLA_URL");

        let depot = Coordinates::new(
            env_parse("PLANNER_DEPOT_LAT", DEFAULT_DEPOT.lat)?,
            env_parse("PLANNER_DEPOT_LNG", DEFAULT_DEPOT.lng)?,
        );
        if !depot.is_valid() {
            anyhow::bail!("Depot coordinates out of range: ({}, {})", depot.lat, depot.lng);
        }

        let daily_quota = env_parse("PLANNER_DAILY_QUOTA", DEFAULT_DAILY_QUOTA)?;
        if daily_quota == 0 {
            anyhow::bail!("PLANNER_DAILY_QUOTA must be at least 1");
        }

        let speed_kmh = env_parse("PLANNER_SPEED_KMH", DEFAULT_SPEED_KMH)?;
        if !speed_kmh.is_finite() || speed_kmh <= 0.0 {
            anyhow::bail!("PLANNER_SPEED_KMH must be positive, got {}", speed_kmh);
        }

        let utc_offset_minutes = env_parse("PLANNER_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES)?;
        if utc_offset_minutes.abs() >= 24 * 60 {
            anyhow::bail!("PLANNER_UTC_OFFSET_MINUTES out of range: {}", utc_offset_minutes);
        }

        let inspectors = match env_opt("PLANNER_INSPECTORS") {
            Some(raw) => parse_inspectors(&raw).context("Invalid PLANNER_INSPECTORS")?,
            None => default_inspectors(),
        };
        if inspectors.is_empty() {
            anyhow::bail!("PLANNER_INSPECTORS lists no inspectors");
        }

        let category = env_opt("PLANNER_CATEGORY");

        Ok(Self {
            logs_dir,
            valhalla_url,
            depot,
            daily_quota,
            speed_kmh,
            utc_offset_minutes,
            inspectors,
            category,
        })
    }

    /// Working-day clock offset as a chrono offset
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("Invalid UTC offset of {} minutes", self.utc_offset_minutes))
    }
}
