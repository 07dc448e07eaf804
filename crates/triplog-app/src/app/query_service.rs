//! Query Service - Access Stored Data
//!
//! This service provides read-only access to stored data:
//! - Vehicles and parties, most recent trip first
//! - Trip detail by key
//! - Trips of a vehicle or a party

use thiserror::Error;
use triplog_domain::{normalize_party_name, normalize_vehicle_no, EntityRepository, Party, Trip, Vehicle};
use triplog_types::StoreError;

/// Errors specific to the query service
#[derive(Debug, Error)]
pub enum QueryServiceError {
    #[error("Store not accessible: {0}")]
    StoreError(#[from] StoreError),

    #[error("Entry not found: {0}")]
    NotFound(String),
}

impl From<QueryServiceError> for triplog_types::Error {
    fn from(err: QueryServiceError) -> Self {
        match err {
            QueryServiceError::StoreError(e) => triplog_types::Error::Store(e),
            QueryServiceError::NotFound(what) => triplog_types::Error::NotFound(what),
        }
    }
}

// ============================================================================
// Aggregate Queries
// ============================================================================

/// Get vehicles, most recently used first
pub async fn get_vehicles<R: EntityRepository + ?Sized>(
    repo: &R,
    limit: Option<usize>,
) -> Result<Vec<Vehicle>, QueryServiceError> {
    Ok(repo.list_vehicles(limit).await?)
}

/// Get parties, most recently used first
pub async fn get_parties<R: EntityRepository + ?Sized>(
    repo: &R,
    limit: Option<usize>,
) -> Result<Vec<Party>, QueryServiceError> {
    Ok(repo.list_parties(limit).await?)
}

/// Get a vehicle by number in any spelling ("mh 12 ab 1234")
pub async fn get_vehicle<R: EntityRepository + ?Sized>(
    repo: &R,
    number: &str,
) -> Result<Vehicle, QueryServiceError> {
    let number = normalize_vehicle_no(number);
    let vehicle = repo.find_vehicle(&number).await?;
    vehicle.ok_or(QueryServiceError::NotFound(number))
}

// ============================================================================
// Trip Queries
// ============================================================================

/// Get a single trip
pub async fn get_trip<R: EntityRepository + ?Sized>(
    repo: &R,
    key: &str,
) -> Result<Trip, QueryServiceError> {
    repo.get_trip(key)
        .await?
        .ok_or_else(|| QueryServiceError::NotFound(key.to_string()))
}

/// Get trips of a vehicle, newest first
pub async fn get_trips_for_vehicle<R: EntityRepository + ?Sized>(
    repo: &R,
    number: &str,
) -> Result<Vec<Trip>, QueryServiceError> {
    Ok(repo.trips_for_vehicle(&normalize_vehicle_no(number)).await?)
}

/// Get trips whose first route starts or ends at a party, newest first
pub async fn get_trips_for_party<R: EntityRepository + ?Sized>(
    repo: &R,
    name: &str,
) -> Result<Vec<Trip>, QueryServiceError> {
    Ok(repo.trips_for_party(&normalize_party_name(name)).await?)
}
