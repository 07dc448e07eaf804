//! Entity repository backed by a DocumentStore
//!
//! Document keys: trips use their generated key, vehicles their normalized
//! number, parties their normalized name. Trip documents also carry the
//! first route's `from`/`to` at top level so they can be queried by party.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use triplog_domain::{EntityBatch, EntityRepository, EntityWrite, Party, Trip, Vehicle};
use triplog_store::{Collection, Document, DocumentStore, Fields, WriteBatch};
use triplog_types::StoreError;

const TRIP_COUNT: &str = "tripCount";
const LAST_TRIP: &str = "lastTrip";

/// Implementation of EntityRepository over any DocumentStore
pub struct DocumentEntityRepository<S> {
    store: S,
}

impl<S: DocumentStore> DocumentEntityRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Translate a typed batch into store writes
    pub fn to_write_batch(&self, batch: EntityBatch) -> Result<WriteBatch, StoreError> {
        let mut out = self.store.begin_batch();
        for write in batch.into_writes() {
            match write {
                EntityWrite::InsertTrip(trip) => {
                    let mut fields = to_fields(&trip)?;
                    if let Some(first) = trip.first_route() {
                        fields.insert("from".to_string(), json!(first.from));
                        fields.insert("to".to_string(), json!(first.to));
                    }
                    out.upsert_create(Collection::Trips, Some(trip.key), fields);
                }
                EntityWrite::CreateVehicle(vehicle) => {
                    let fields = to_fields(&vehicle)?;
                    out.upsert_create(Collection::Vehicles, Some(vehicle.number), fields);
                }
                EntityWrite::BumpVehicle {
                    number,
                    last_trip,
                    by,
                } => {
                    out.upsert_increment(
                        Collection::Vehicles,
                        number,
                        TRIP_COUNT,
                        by as i64,
                        last_trip_fields(last_trip),
                    );
                }
                EntityWrite::CreateParty(party) => {
                    let fields = to_fields(&party)?;
                    out.upsert_create(Collection::Parties, Some(party.name), fields);
                }
                EntityWrite::BumpParty {
                    name,
                    last_trip,
                    by,
                } => {
                    out.upsert_increment(
                        Collection::Parties,
                        name,
                        TRIP_COUNT,
                        by as i64,
                        last_trip_fields(last_trip),
                    );
                }
            }
        }
        Ok(out)
    }

    async fn find_one<T: DeserializeOwned>(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<T>, StoreError> {
        let docs = self
            .store
            .query_equals(collection, field, &Value::from(value))
            .await?;
        docs.into_iter().next().map(decode).transpose()
    }

    async fn trips_where(&self, field: &str, value: &str) -> Result<Vec<Trip>, StoreError> {
        let docs = self
            .store
            .query_equals(Collection::Trips, field, &Value::from(value))
            .await?;
        docs.into_iter().map(decode_trip).collect()
    }
}

fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Rejected(format!(
            "entity did not serialize to an object: {}",
            other
        ))),
    }
}

fn last_trip_fields(last_trip: chrono::NaiveDate) -> Fields {
    let mut fields = Fields::new();
    fields.insert(LAST_TRIP.to_string(), json!(last_trip));
    fields
}

fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    let key = doc.key;
    serde_json::from_value(Value::Object(doc.fields))
        .map_err(|e| StoreError::Corrupted(format!("document '{}': {}", key, e)))
}

fn decode_trip(doc: Document) -> Result<Trip, StoreError> {
    let key = doc.key.clone();
    let mut trip: Trip = decode(doc)?;
    trip.key = key;
    Ok(trip)
}

fn newest_first(trips: &mut [Trip]) {
    trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.key.cmp(&a.key)));
}

#[async_trait]
impl<S: DocumentStore> EntityRepository for DocumentEntityRepository<S> {
    async fn get_trip(&self, key: &str) -> Result<Option<Trip>, StoreError> {
        self.store
            .get(Collection::Trips, key)
            .await?
            .map(decode_trip)
            .transpose()
    }

    async fn find_vehicle(&self, number: &str) -> Result<Option<Vehicle>, StoreError> {
        self.find_one(Collection::Vehicles, "number", number).await
    }

    async fn find_party(&self, name: &str) -> Result<Option<Party>, StoreError> {
        self.find_one(Collection::Parties, "name", name).await
    }

    async fn search_parties(&self, prefix: &str, limit: usize) -> Result<Vec<Party>, StoreError> {
        let docs = self
            .store
            .query_prefix(Collection::Parties, "name", prefix, limit)
            .await?;
        docs.into_iter().map(decode).collect()
    }

    async fn list_vehicles(&self, limit: Option<usize>) -> Result<Vec<Vehicle>, StoreError> {
        let docs = self
            .store
            .list(Collection::Vehicles, LAST_TRIP, true, limit)
            .await?;
        docs.into_iter().map(decode).collect()
    }

    async fn list_parties(&self, limit: Option<usize>) -> Result<Vec<Party>, StoreError> {
        let docs = self
            .store
            .list(Collection::Parties, LAST_TRIP, true, limit)
            .await?;
        docs.into_iter().map(decode).collect()
    }

    async fn trips_for_vehicle(&self, number: &str) -> Result<Vec<Trip>, StoreError> {
        let mut trips = self.trips_where("vehicle", number).await?;
        newest_first(&mut trips);
        Ok(trips)
    }

    async fn trips_for_party(&self, name: &str) -> Result<Vec<Trip>, StoreError> {
        let mut trips = self.trips_where("from", name).await?;
        let mut seen: HashSet<String> = trips.iter().map(|t| t.key.clone()).collect();
        for trip in self.trips_where("to", name).await? {
            if seen.insert(trip.key.clone()) {
                trips.push(trip);
            }
        }
        newest_first(&mut trips);
        Ok(trips)
    }

    async fn commit(&self, batch: EntityBatch) -> Result<(), StoreError> {
        let writes = self.to_write_batch(batch)?;
        debug!(ops = writes.len(), "committing entity batch");
        self.store.commit(writes).await
    }
}
