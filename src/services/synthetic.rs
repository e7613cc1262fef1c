//! Seeded synthetic outlet pools for demos and load testing.
//!
//! Generation is fully determined by the seed: the same seed, count and
//! spec always yield the same pool.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::types::{Coordinates, Grade, Outlet};

const KM_PER_DEGREE: f64 = 111.32;

const AREAS: &[&str] = &[
    "Al Quoz", "Al Barsha", "Al Karama", "Al Garhoud", "Al Qudra", "Al Maktoum", "Al Wasl", "Al Safa",
];

const CATEGORIES: &[&str] = &["Restaurant", "Accommodation", "Cafeteria", "Hotel", "Cafe"];

const NAME_PREFIXES: &[&str] = &[
    "Golden", "Palm", "Desert", "Marina", "Creek", "Oasis", "Falcon", "Pearl", "Cedar", "Saffron",
];

/// Shape of a generated pool
#[derive(Debug, Clone)]
pub struct PoolSpec {
    pub center: Coordinates,
    /// Outlets are scattered uniformly inside this square half-width
    pub radius_km: f64,
    pub areas: Vec<String>,
    pub categories: Vec<String>,
    /// Forecast volume range, inclusive lower / exclusive upper
    pub volume_range: (f64, f64),
}

impl Default for PoolSpec {
    fn default() -> Self {
        Self {
            center: Coordinates::new(25.2048, 55.2708),
            radius_km: 15.0,
            areas: AREAS.iter().map(|s| s.to_string()).collect(),
            categories: CATEGORIES.iter().map(|s| s.to_string()).collect(),
            volume_range: (1000.0, 10000.0),
        }
    }
}

fn grade_for_risk(risk: f64) -> Grade {
    if risk < 0.25 {
        Grade::A
    } else if risk < 0.5 {
        Grade::B
    } else if risk < 0.75 {
        Grade::C
    } else {
        Grade::D
    }
}

fn pick<'a>(rng: &mut StdRng, values: &'a [String], fallback: &'a str) -> &'a str {
    if values.is_empty() {
        fallback
    } else {
        &values[rng.gen_range(0..values.len())]
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Generate `count` outlets with ids `1..=count`
pub fn generate_pool(seed: u64, count: usize, spec: &PoolSpec) -> Vec<Outlet> {
    let mut rng = StdRng::seed_from_u64(seed);
    let lat_span = spec.radius_km / KM_PER_DEGREE;
    let lng_span = spec.radius_km / (KM_PER_DEGREE * spec.center.lat.to_radians().cos().max(0.01));
    let (min_volume, max_volume) = spec.volume_range;

    let outlets: Vec<Outlet> = (1..=count as u32)
        .map(|id| {
            let area = pick(&mut rng, &spec.areas, "Unassigned").to_string();
            let category = pick(&mut rng, &spec.categories, "General").to_string();
            let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
            let risk_score = round_to(rng.gen_range(0.0..=1.0), 3);
            let forecast_volume = if max_volume > min_volume {
                round_to(rng.gen_range(min_volume..max_volume), 1)
            } else {
                min_volume
            };
            let latitude = (spec.center.lat + rng.gen_range(-lat_span..=lat_span)).clamp(-90.0, 90.0);
            let longitude = (spec.center.lng + rng.gen_range(-lng_span..=lng_span)).clamp(-180.0, 180.0);
            let zone = if latitude >= spec.center.lat { "North" } else { "South" };

            Outlet {
                id,
                name: format!("{} {} {:03}", prefix, category, id),
                area,
                category,
                grade: grade_for_risk(risk_score),
                risk_score,
                forecast_volume,
                latitude: round_to(latitude, 6),
                longitude: round_to(longitude, 6),
                zone: Some(zone.to_string()),
            }
        })
        .collect();

    debug!("Generated {} synthetic outlets from seed {}", outlets.len(), seed);
    outlets
}
