//! Trip validation and name normalization

use thiserror::Error;

use crate::model::TripDraft;

/// A required trip field that was empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    VehicleNo,
    Driver,
    Routes,
    /// Origin of the route at this 0-based index
    RouteFrom(usize),
    /// Destination of the route at this 0-based index
    RouteTo(usize),
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::VehicleNo => write!(f, "vehicle number"),
            MissingField::Driver => write!(f, "driver"),
            MissingField::Routes => write!(f, "at least one route"),
            MissingField::RouteFrom(i) => write!(f, "route {} from", i + 1),
            MissingField::RouteTo(i) => write!(f, "route {} to", i + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required field: {missing_field}")]
pub struct ValidationError {
    pub missing_field: MissingField,
}

impl From<MissingField> for ValidationError {
    fn from(missing_field: MissingField) -> Self {
        Self { missing_field }
    }
}

/// Check a draft before any store access. Reports the first missing field.
pub fn validate(draft: &TripDraft) -> Result<(), ValidationError> {
    if draft.vehicle_no.trim().is_empty() {
        return Err(MissingField::VehicleNo.into());
    }
    if draft.driver.trim().is_empty() {
        return Err(MissingField::Driver.into());
    }
    if draft.routes.is_empty() {
        return Err(MissingField::Routes.into());
    }
    for (i, route) in draft.routes.iter().enumerate() {
        if route.from.trim().is_empty() {
            return Err(MissingField::RouteFrom(i).into());
        }
        if route.to.trim().is_empty() {
            return Err(MissingField::RouteTo(i).into());
        }
    }
    Ok(())
}

/// Vehicle numbers compare case-insensitively and ignore spacing:
/// "mh 12 ab 1234" and "MH12AB1234" are the same vehicle.
pub fn normalize_vehicle_no(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn normalize_party_name(raw: &str) -> String {
    raw.trim().to_string()
}
