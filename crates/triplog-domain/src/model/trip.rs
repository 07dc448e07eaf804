//! Trip records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::service::{normalize_party_name, normalize_vehicle_no};

/// One leg of a trip, from one party to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: String,
    pub to: String,
}

impl RouteSegment {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Trip as entered by field staff, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripDraft {
    pub date: NaiveDate,
    pub driver: String,
    pub vehicle_no: String,
    pub routes: Vec<RouteSegment>,
}

impl TripDraft {
    pub fn new(date: NaiveDate, driver: impl Into<String>, vehicle_no: impl Into<String>) -> Self {
        Self {
            date,
            driver: driver.into(),
            vehicle_no: vehicle_no.into(),
            routes: Vec::new(),
        }
    }

    pub fn with_route(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.routes.push(RouteSegment::new(from, to));
        self
    }
}

/// A recorded trip
///
/// Immutable once committed. `key` is the document key and is not part of
/// the stored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(skip)]
    pub key: String,
    pub date: NaiveDate,
    pub driver: String,
    #[serde(rename = "vehicle")]
    pub vehicle_no: String,
    pub routes: Vec<RouteSegment>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Build a trip from a validated draft, normalizing every name
    pub fn from_draft(draft: &TripDraft, key: String, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            date: draft.date,
            driver: draft.driver.trim().to_string(),
            vehicle_no: normalize_vehicle_no(&draft.vehicle_no),
            routes: draft
                .routes
                .iter()
                .map(|r| RouteSegment::new(normalize_party_name(&r.from), normalize_party_name(&r.to)))
                .collect(),
            created_at,
        }
    }

    /// The segment that drives vehicle and party aggregation
    pub fn first_route(&self) -> Option<&RouteSegment> {
        self.routes.first()
    }
}
