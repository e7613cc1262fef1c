//! Error types for the planning core

use thiserror::Error;

/// Errors surfaced by the allocator, sequencer, estimator and exporters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Inputs that make allocation meaningless (no inspectors, zero quota, bad window).
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// A single calendar entry that cannot be serialized safely.
    #[error("Cannot export calendar entry '{uid}': {reason}")]
    ExportFormat { uid: String, reason: String },

    #[error("Invalid outlet {id}: {reason}")]
    InvalidOutlet { id: u32, reason: String },

    /// Outlet payload that is not a JSON array of outlet records
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Routing error: {0}")]
    Routing(String),
}

impl PlanError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short machine-readable code, used in warnings and logs.
    pub const fn code(&self) -> &'static str {
        match self {
            PlanError::Configuration(_) => "CONFIGURATION_ERROR",
            PlanError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
            PlanError::ExportFormat { .. } => "EXPORT_FORMAT_ERROR",
            PlanError::InvalidOutlet { .. } => "INVALID_OUTLET",
            PlanError::Input(_) => "INVALID_INPUT",
            PlanError::Routing(_) => "ROUTING_ERROR",
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
