//! Inspection Planner - operator binary
//!
//! Loads an outlet snapshot, allocates the inspection calendar and writes
//! report, calendar and table files. Routes can be sequenced for any
//! selection of the schedule.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use inspection_planner::config::Config;
use inspection_planner::services::allocator::{allocate, AllocatorConfig};
use inspection_planner::services::export::{render_csv, to_table, CalendarExporter};
use inspection_planner::services::geo::HaversineEstimator;
use inspection_planner::services::ingest::load_outlets;
use inspection_planner::services::routing::{
    create_routing_service_with_fallback, sequence_with_routing, RoutingService,
};
use inspection_planner::services::selection::OutletFilter;
use inspection_planner::services::sequencer::RouteOptions;
use inspection_planner::services::summary::schedule_report;
use inspection_planner::services::synthetic::{generate_pool, PoolSpec};
use inspection_planner::types::{DateRange, Route, RouteReport, Schedule};

use cli::{Cli, Command, PlanArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,inspection_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    info!("Configuration loaded ({} inspectors, quota {})", config.inspectors.len(), config.daily_quota);

    match cli.command {
        Command::Schedule { plan, out_dir, generated_at } => {
            let schedule = plan_schedule(&plan, &config)?;
            let generated_at = generated_at.unwrap_or_else(Utc::now);
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

            let exporter = CalendarExporter::new(generated_at, config.utc_offset()?);
            let calendar = exporter.to_calendar(&schedule);
            for rejected in &calendar.rejected {
                warn!("Calendar entry skipped: {}", rejected);
            }
            write_file(&out_dir.join("schedule.ics"), &calendar.content)?;

            let csv = render_csv(&to_table(&schedule)).context("Failed to render schedule table")?;
            write_file(&out_dir.join("schedule.csv"), &csv)?;

            let report = schedule_report(&schedule, calendar.reference("schedule.ics"), Uuid::new_v4(), generated_at);
            write_json(&out_dir.join("schedule.json"), &report)?;

            info!(
                "Schedule run {} written to {}: {} visits over {} days",
                report.run_id,
                out_dir.display(),
                schedule.item_count(),
                schedule.days.len()
            );
        }
        Command::Route { plan, select, max_stops, out } => {
            let schedule = plan_schedule(&plan, &config)?;
            let selection = select.selection().context("A route selection is required")?;
            let items = selection.items(&schedule);

            let options = RouteOptions { max_stops, ..RouteOptions::default() };
            let route = match selection.route_date(&schedule) {
                Some(date) => {
                    let service = create_routing_service_with_fallback(
                        config.valhalla_url.clone(),
                        HaversineEstimator::with_speed(config.speed_kmh),
                    )
                    .await;
                    info!("Sequencing {} ({} items) with {}", selection.label(), items.len(), service.name());
                    sequence_with_routing(service.as_ref(), &items, date, config.depot, &options).await?
                }
                None => {
                    warn!("{} matches no scheduled visits", selection.label());
                    Route::empty(schedule.period.start, config.depot, options.departure)
                }
            };

            let report = RouteReport::new(route, selection.label(), selection.inspector(&schedule));
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
            }
            write_json(&out, &report)?;
            info!(
                "Route with {} stops, {:.1} km written to {}",
                report.stops.len(),
                report.total_distance_km,
                out.display()
            );
        }
        Command::SynthPool { seed, count, out } => {
            let spec = PoolSpec { center: config.depot, ..PoolSpec::default() };
            let pool = generate_pool(seed, count, &spec);
            write_json(&out, &pool)?;
            info!("Synthetic pool of {} outlets (seed {}) written to {}", pool.len(), seed, out.display());
        }
    }

    Ok(())
}

/// Load, filter and allocate according to the shared planning arguments
fn plan_schedule(plan: &PlanArgs, config: &Config) -> Result<Schedule> {
    let outlets = load_outlets(&plan.outlets)?;

    let filter = OutletFilter {
        category: plan.category.clone().or_else(|| config.category.clone()),
        area: plan.area.clone(),
        min_risk: plan.min_risk,
        ..OutletFilter::default()
    };
    let eligible = filter.apply(&outlets);

    let (year, month) = plan.start;
    let window = DateRange::months(year, month, plan.months)?;
    let quota = plan.quota.unwrap_or(config.daily_quota);

    let schedule = allocate(&eligible, &window, &config.inspectors, quota, &AllocatorConfig::default())
        .context("Schedule allocation failed")?;
    for warning in &schedule.warnings {
        warn!("Schedule warning: {:?}", warning);
    }
    Ok(schedule)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    write_file(path, &json)
}
