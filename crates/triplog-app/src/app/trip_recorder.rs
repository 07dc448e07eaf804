//! Trip Recorder - Core Use Case for Trip Submission
//!
//! Records one trip and keeps the vehicle and party aggregates in step:
//! 1. Validate the draft (no store access on failure)
//! 2. Normalize names and mint a trip key
//! 3. Look up the vehicle and both parties of the first route, concurrently
//! 4. Build one batch: trip insert plus a create or bump per aggregate
//! 5. Commit the batch atomically
//!
//! Lookups happen outside the batch, so two submissions can both decide to
//! create the same aggregate. The store refuses the second create with a
//! conflict and that submission is rebuilt from step 2, which turns the
//! losing create into an increment.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use triplog_domain::{
    validate, EntityBatch, EntityRepository, MissingField, Party, Trip, TripDraft,
    TripKeyGenerator, ValidationError, Vehicle,
};
use triplog_types::StoreError;

/// Failures talking to the store while recording
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Existence check failed: {0}")]
    Lookup(#[source] StoreError),

    #[error("Commit failed, nothing was recorded: {0}")]
    Commit(#[source] StoreError),

    #[error("Trip {trip_key} was possibly recorded, verify before retrying: {cause}")]
    Indeterminate {
        trip_key: String,
        #[source]
        cause: StoreError,
    },
}

/// Errors returned to the caller of [`TripRecorder::record`]
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<RecordError> for triplog_types::Error {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(e) => triplog_types::Error::InvalidInput(e.to_string()),
            RecordError::Persistence(e) => triplog_types::Error::Submission(e.to_string()),
        }
    }
}

/// Outcome of a committed trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedTrip {
    pub key: String,
    /// The vehicle was seen for the first time
    pub vehicle_created: bool,
    /// Parties seen for the first time
    pub parties_created: Vec<String>,
    /// The commit acknowledgement was lost and the trip was confirmed by reading it back
    pub verified_by_read_back: bool,
}

/// Coordinates trip insertion with aggregate maintenance
pub struct TripRecorder<R> {
    repo: R,
    keys: TripKeyGenerator,
    conflict_retries: u32,
}

impl<R: EntityRepository> TripRecorder<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            keys: TripKeyGenerator::new(),
            conflict_retries: 3,
        }
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Record a trip. Returns the generated trip key on success.
    pub async fn record(&self, draft: &TripDraft) -> Result<RecordedTrip, RecordError> {
        validate(draft)?;

        let mut conflicts = 0;
        loop {
            let (batch, recorded) = self.plan(draft).await?;
            debug!(trip = %recorded.key, writes = batch.len(), "committing trip");

            let err = match self.repo.commit(batch).await {
                Ok(()) => {
                    info!(
                        trip = %recorded.key,
                        vehicle_created = recorded.vehicle_created,
                        parties_created = recorded.parties_created.len(),
                        "trip recorded"
                    );
                    return Ok(recorded);
                }
                Err(err) => err,
            };

            if err.is_conflict() && conflicts < self.conflict_retries {
                conflicts += 1;
                warn!(trip = %recorded.key, attempt = conflicts, error = %err, "commit conflicted, rebuilding");
                continue;
            }
            if !err.is_definite() {
                return self.verify(recorded, err).await;
            }
            return Err(PersistenceError::Commit(err).into());
        }
    }

    /// Existence checks and batch assembly for one attempt
    async fn plan(&self, draft: &TripDraft) -> Result<(EntityBatch, RecordedTrip), RecordError> {
        let now = Utc::now();
        let mut trip = Trip::from_draft(draft, String::new(), now);
        trip.key = self.keys.generate(trip.date, &trip.vehicle_no, now);

        let first = trip
            .first_route()
            .cloned()
            .ok_or(ValidationError::from(MissingField::Routes))?;

        let (vehicle, origin, destination) = tokio::try_join!(
            self.repo.find_vehicle(&trip.vehicle_no),
            self.repo.find_party(&first.from),
            self.repo.find_party(&first.to),
        )
        .map_err(PersistenceError::Lookup)?;

        let mut recorded = RecordedTrip {
            key: trip.key.clone(),
            vehicle_created: vehicle.is_none(),
            parties_created: Vec::new(),
            verified_by_read_back: false,
        };

        let mut batch = EntityBatch::new();
        match vehicle {
            Some(_) => batch.bump_vehicle(trip.vehicle_no.clone(), trip.date),
            None => batch.create_vehicle(Vehicle::first_seen(trip.vehicle_no.clone(), trip.date, now)),
        }
        for (name, existing) in [(&first.from, origin), (&first.to, destination)] {
            match existing {
                Some(_) => batch.bump_party(name.clone(), trip.date),
                None => {
                    if !recorded.parties_created.contains(name) {
                        recorded.parties_created.push(name.clone());
                    }
                    batch.create_party(Party::first_seen(name.clone(), trip.date, now));
                }
            }
        }
        batch.insert_trip(trip);

        Ok((batch, recorded))
    }

    /// Decide the outcome of a commit whose acknowledgement never arrived
    async fn verify(
        &self,
        mut recorded: RecordedTrip,
        cause: StoreError,
    ) -> Result<RecordedTrip, RecordError> {
        warn!(trip = %recorded.key, error = %cause, "commit outcome unknown, reading trip back");
        match self.repo.get_trip(&recorded.key).await {
            Ok(Some(_)) => {
                info!(trip = %recorded.key, "trip recorded (confirmed by read-back)");
                recorded.verified_by_read_back = true;
                Ok(recorded)
            }
            Ok(None) => Err(PersistenceError::Commit(cause).into()),
            Err(read_err) => {
                warn!(trip = %recorded.key, error = %read_err, "read-back failed");
                Err(PersistenceError::Indeterminate {
                    trip_key: recorded.key,
                    cause,
                }
                .into())
            }
        }
    }
}
