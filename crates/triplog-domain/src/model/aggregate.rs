//! Aggregate entities maintained from trips

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Vehicle aggregate, keyed by normalized vehicle number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub number: String,
    #[serde(alias = "loadCount")]
    pub trip_count: u64,
    pub last_trip: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// A vehicle seen for the first time on `date`
    pub fn first_seen(number: impl Into<String>, date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            number: number.into(),
            trip_count: 1,
            last_trip: date,
            created_at,
        }
    }
}

/// Trading party aggregate, keyed by normalized name
///
/// Origin and destination roles are not distinguished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    #[serde(alias = "loadCount")]
    pub trip_count: u64,
    pub last_trip: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Party {
    pub fn first_seen(name: impl Into<String>, date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            trip_count: 1,
            last_trip: date,
            created_at,
        }
    }
}
