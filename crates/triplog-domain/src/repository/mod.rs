//! Repository trait definitions for trips, vehicles and parties

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{Party, Trip, Vehicle};
use triplog_types::StoreError;

/// A typed write inside an [`EntityBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum EntityWrite {
    InsertTrip(Trip),
    CreateVehicle(Vehicle),
    BumpVehicle {
        number: String,
        last_trip: NaiveDate,
        by: u64,
    },
    CreateParty(Party),
    BumpParty {
        name: String,
        last_trip: NaiveDate,
        by: u64,
    },
}

/// Typed write plan committed atomically by an [`EntityRepository`]
///
/// Repeated references to the same aggregate fold into one write, so a trip
/// whose origin and destination are the same party counts twice without
/// producing two writes to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBatch {
    writes: Vec<EntityWrite>,
}

impl EntityBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_trip(&mut self, trip: Trip) {
        self.writes.push(EntityWrite::InsertTrip(trip));
    }

    pub fn create_vehicle(&mut self, vehicle: Vehicle) {
        for write in &mut self.writes {
            if let EntityWrite::CreateVehicle(existing) = write {
                if existing.number == vehicle.number {
                    existing.trip_count += vehicle.trip_count;
                    existing.last_trip = existing.last_trip.max(vehicle.last_trip);
                    return;
                }
            }
        }
        self.writes.push(EntityWrite::CreateVehicle(vehicle));
    }

    pub fn bump_vehicle(&mut self, number: impl Into<String>, last_trip: NaiveDate) {
        let number = number.into();
        for write in &mut self.writes {
            if let EntityWrite::BumpVehicle {
                number: existing,
                last_trip: last,
                by,
            } = write
            {
                if *existing == number {
                    *by += 1;
                    *last = (*last).max(last_trip);
                    return;
                }
            }
        }
        self.writes.push(EntityWrite::BumpVehicle {
            number,
            last_trip,
            by: 1,
        });
    }

    pub fn create_party(&mut self, party: Party) {
        for write in &mut self.writes {
            if let EntityWrite::CreateParty(existing) = write {
                if existing.name == party.name {
                    existing.trip_count += party.trip_count;
                    existing.last_trip = existing.last_trip.max(party.last_trip);
                    return;
                }
            }
        }
        self.writes.push(EntityWrite::CreateParty(party));
    }

    pub fn bump_party(&mut self, name: impl Into<String>, last_trip: NaiveDate) {
        let name = name.into();
        for write in &mut self.writes {
            if let EntityWrite::BumpParty {
                name: existing,
                last_trip: last,
                by,
            } = write
            {
                if *existing == name {
                    *by += 1;
                    *last = (*last).max(last_trip);
                    return;
                }
            }
        }
        self.writes.push(EntityWrite::BumpParty {
            name,
            last_trip,
            by: 1,
        });
    }

    pub fn writes(&self) -> &[EntityWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<EntityWrite> {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Typed access to the trips, vehicles and parties collections
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Find a trip by its key
    async fn get_trip(&self, key: &str) -> Result<Option<Trip>, StoreError>;

    /// Find a vehicle by normalized number
    async fn find_vehicle(&self, number: &str) -> Result<Option<Vehicle>, StoreError>;

    /// Find a party by normalized name
    async fn find_party(&self, name: &str) -> Result<Option<Party>, StoreError>;

    /// Parties whose name starts with `prefix`, ordered by name
    async fn search_parties(&self, prefix: &str, limit: usize) -> Result<Vec<Party>, StoreError>;

    /// Vehicles, most recent trip first
    async fn list_vehicles(&self, limit: Option<usize>) -> Result<Vec<Vehicle>, StoreError>;

    /// Parties, most recent trip first
    async fn list_parties(&self, limit: Option<usize>) -> Result<Vec<Party>, StoreError>;

    /// Trips of one vehicle, newest first
    async fn trips_for_vehicle(&self, number: &str) -> Result<Vec<Trip>, StoreError>;

    /// Trips starting or ending at a party, newest first
    async fn trips_for_party(&self, name: &str) -> Result<Vec<Trip>, StoreError>;

    /// Commit every write of the batch, or none
    async fn commit(&self, batch: EntityBatch) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: EntityRepository + ?Sized> EntityRepository for Arc<T> {
    async fn get_trip(&self, key: &str) -> Result<Option<Trip>, StoreError> {
        (**self).get_trip(key).await
    }

    async fn find_vehicle(&self, number: &str) -> Result<Option<Vehicle>, StoreError> {
        (**self).find_vehicle(number).await
    }

    async fn find_party(&self, name: &str) -> Result<Option<Party>, StoreError> {
        (**self).find_party(name).await
    }

    async fn search_parties(&self, prefix: &str, limit: usize) -> Result<Vec<Party>, StoreError> {
        (**self).search_parties(prefix, limit).await
    }

    async fn list_vehicles(&self, limit: Option<usize>) -> Result<Vec<Vehicle>, StoreError> {
        (**self).list_vehicles(limit).await
    }

    async fn list_parties(&self, limit: Option<usize>) -> Result<Vec<Party>, StoreError> {
        (**self).list_parties(limit).await
    }

    async fn trips_for_vehicle(&self, number: &str) -> Result<Vec<Trip>, StoreError> {
        (**self).trips_for_vehicle(number).await
    }

    async fn trips_for_party(&self, name: &str) -> Result<Vec<Trip>, StoreError> {
        (**self).trips_for_party(name).await
    }

    async fn commit(&self, batch: EntityBatch) -> Result<(), StoreError> {
        (**self).commit(batch).await
    }
}
