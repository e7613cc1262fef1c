//! Outlet pool ingestion from JSON snapshots

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::error::{PlanError, PlanResult};
use crate::types::Outlet;

fn invalid(outlet: &Outlet, reason: impl Into<String>) -> PlanError {
    PlanError::InvalidOutlet {
        id: outlet.id,
        reason: reason.into(),
    }
}

/// Reject records the planner cannot work with
pub fn validate_outlet(outlet: &Outlet) -> PlanResult<()> {
    if outlet.name.trim().is_empty() {
        return Err(invalid(outlet, "name is empty"));
    }
    if !outlet.risk_score.is_finite() || !(0.0..=1.0).contains(&outlet.risk_score) {
        return Err(invalid(outlet, format!("risk_score {} outside [0, 1]", outlet.risk_score)));
    }
    if !outlet.forecast_volume.is_finite() || outlet.forecast_volume < 0.0 {
        return Err(invalid(outlet, format!("forecast_volume {} is negative", outlet.forecast_volume)));
    }
    if !outlet.coordinates().is_valid() {
        return Err(invalid(
            outlet,
            format!("coordinates ({}, {}) out of range", outlet.latitude, outlet.longitude),
        ));
    }
    Ok(())
}

/// Validate every record and require unique ids
pub fn validate_pool(outlets: &[Outlet]) -> PlanResult<()> {
    let mut ids = HashSet::with_capacity(outlets.len());
    for outlet in outlets {
        validate_outlet(outlet)?;
        if !ids.insert(outlet.id) {
            return Err(invalid(outlet, "duplicate id"));
        }
    }
    Ok(())
}

/// Parse a JSON array of outlet records
pub fn parse_outlets(json: &str) -> PlanResult<Vec<Outlet>> {
    let outlets: Vec<Outlet> =
        serde_json::from_str(json).map_err(|e| PlanError::Input(format!("outlet JSON: {}", e)))?;
    validate_pool(&outlets)?;
    Ok(outlets)
}

/// Load and validate an outlet snapshot file
pub fn load_outlets(path: impl AsRef<Path>) -> Result<Vec<Outlet>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read outlet snapshot {}", path.display()))?;
    let outlets = parse_outlets(&json).with_context(|| format!("Invalid outlet snapshot {}", path.display()))?;
    info!("Loaded {} outlets from {}", outlets.len(), path.display());
    Ok(outlets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {"id": 1, "name": "Al Fanar", "area": "Festival City", "category": "Restaurant",
         "grade": "A", "risk_score": 0.12, "forecast_volume": 35.0,
         "latitude": 25.2215, "longitude": 55.3520},
        {"id": 2, "name": "Ravi", "area": "Satwa", "category": "Restaurant",
         "grade": "C", "risk_score": 0.88, "forecast_volume": 210.0,
         "latitude": 25.2336, "longitude": 55.2741, "zone": "Central"}
    ]"#;

    #[test]
    fn test_parse_valid_pool() {
        let outlets = parse_outlets(VALID).unwrap();
        assert_eq!(outlets.len(), 2);
        assert_eq!(outlets[1].zone.as_deref(), Some("Central"));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(parse_outlets(r#"{"id": 1}"#), Err(PlanError::Input(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = VALID.replace("\"id\": 2", "\"id\": 1");
        let err = parse_outlets(&json).unwrap_err();
        assert_eq!(err, PlanError::InvalidOutlet { id: 1, reason: "duplicate id".into() });
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let risky = VALID.replace("0.88", "1.5");
        assert!(matches!(parse_outlets(&risky), Err(PlanError::InvalidOutlet { id: 2, .. })));

        let negative = VALID.replace("210.0", "-1.0");
        assert!(matches!(parse_outlets(&negative), Err(PlanError::InvalidOutlet { id: 2, .. })));

        let off_map = VALID.replace("55.3520", "255.3520");
        assert!(matches!(parse_outlets(&off_map), Err(PlanError::InvalidOutlet { id: 1, .. })));
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_outlets("[]").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file_has_context() {
        let err = load_outlets("/nonexistent/outlets.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read outlet snapshot"));
    }
}
