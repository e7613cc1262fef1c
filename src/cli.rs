//! CLI argument parsing for the inspection-planner binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use inspection_planner::defaults::DEFAULT_PLANNING_MONTHS;
use inspection_planner::services::selection::RouteSelection;
use inspection_planner::types::Priority;

#[derive(Parser)]
#[command(name = "inspection-planner", about = "Outlet inspection schedule and route planner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Allocate a multi-month schedule and write report, calendar and table
    Schedule {
        #[command(flatten)]
        plan: PlanArgs,
        /// Output directory
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
        /// RFC 3339 instant stamped on the report and calendar (defaults to now)
        #[arg(long)]
        generated_at: Option<chrono::DateTime<chrono::Utc>>,
    },
    /// Allocate a schedule, then sequence one selection of it into a route
    Route {
        #[command(flatten)]
        plan: PlanArgs,
        #[command(flatten)]
        select: SelectArgs,
        /// Keep only the riskiest N stops
        #[arg(long)]
        max_stops: Option<usize>,
        /// Route report path
        #[arg(long, default_value = "out/route.json")]
        out: PathBuf,
    },
    /// Write a seeded synthetic outlet pool
    SynthPool {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 100)]
        count: usize,
        #[arg(long, default_value = "outlets.json")]
        out: PathBuf,
    },
}

/// Inputs shared by every planning command
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// JSON outlet snapshot
    #[arg(long)]
    pub outlets: PathBuf,
    /// First planning month, YYYY-MM
    #[arg(long, value_parser = parse_year_month)]
    pub start: (i32, u32),
    #[arg(long, default_value_t = DEFAULT_PLANNING_MONTHS)]
    pub months: u32,
    /// Visits per working day (overrides PLANNER_DAILY_QUOTA)
    #[arg(long)]
    pub quota: Option<usize>,
    /// Outlet category (overrides PLANNER_CATEGORY)
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub area: Option<String>,
    #[arg(long)]
    pub min_risk: Option<f64>,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SelectArgs {
    #[arg(long)]
    pub day: Option<NaiveDate>,
    #[arg(long)]
    pub inspector: Option<String>,
    #[arg(long = "route-area")]
    pub route_area: Option<String>,
    #[arg(long, value_enum)]
    pub tier: Option<TierArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierArg {
    High,
    Medium,
    Low,
}

impl From<TierArg> for Priority {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::High => Priority::High,
            TierArg::Medium => Priority::Medium,
            TierArg::Low => Priority::Low,
        }
    }
}

impl SelectArgs {
    pub fn selection(&self) -> Option<RouteSelection> {
        if let Some(day) = self.day {
            return Some(RouteSelection::Day(day));
        }
        if let Some(id) = &self.inspector {
            return Some(RouteSelection::Inspector(id.clone()));
        }
        if let Some(area) = &self.route_area {
            return Some(RouteSelection::Area(area.clone()));
        }
        self.tier.map(|tier| RouteSelection::Tier(tier.into()))
    }
}

fn parse_year_month(raw: &str) -> Result<(i32, u32), String> {
    let (year, month) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", raw))?;
    let year: i32 = year.parse().map_err(|_| format!("invalid year in '{}'", raw))?;
    let month: u32 = month.parse().map_err(|_| format!("invalid month in '{}'", raw))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month must be 1-12, got {}", month));
    }
    Ok((year, month))
}
