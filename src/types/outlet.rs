//! Outlet types

use serde::{Deserialize, Serialize};

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within [-90, 90] / [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Same point on the globe: longitude is ignored at the poles and
    /// +180 / -180 name the same meridian.
    pub fn same_place(&self, other: &Coordinates) -> bool {
        if self.lat != other.lat {
            return false;
        }
        if self.lat.abs() == 90.0 {
            return true;
        }
        (self.lng - other.lng).rem_euclid(360.0) == 0.0
    }
}

/// Outlet grade as assigned by the data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

/// Priority tier derived from risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// High above 0.7, Medium above 0.4, Low otherwise.
    pub fn from_risk(risk_score: f64) -> Self {
        if risk_score > 0.7 {
            Priority::High
        } else if risk_score > 0.4 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// On-site service allotment. Never shorter for a higher tier.
    pub const fn service_minutes(self) -> u32 {
        match self {
            Priority::High => 45,
            Priority::Medium => 30,
            Priority::Low => 20,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// A service outlet subject to inspection. Supplied by the data provider, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlet {
    pub id: u32,
    pub name: String,
    pub area: String,
    pub category: String,
    pub grade: Grade,
    /// Probability of a missed service, in [0, 1]
    pub risk_score: f64,
    pub forecast_volume: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Collection zone; falls back to the area when the provider has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl Outlet {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn priority(&self) -> Priority {
        Priority::from_risk(self.risk_score)
    }

    pub fn zone_or_area(&self) -> &str {
        self.zone.as_deref().unwrap_or(&self.area)
    }
}
