//! Integration tests for trip recording and aggregate maintenance

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use tempfile::tempdir;
use triplog_app::repository::open_file_repository_at;
use triplog_app::{PersistenceError, RecordError, TripRecorder};
use triplog_domain::{EntityBatch, EntityRepository, MissingField, Party, Trip, TripDraft, Vehicle};
use triplog_infra::DocumentEntityRepository;
use triplog_store::{Collection, CommitFailure, MemoryStore};
use triplog_types::StoreError;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

fn draft(date: NaiveDate, vehicle: &str, from: &str, to: &str) -> TripDraft {
    TripDraft::new(date, "Ravi Kumar", vehicle).with_route(from, to)
}

fn recorder() -> (Arc<MemoryStore>, TripRecorder<DocumentEntityRepository<Arc<MemoryStore>>>) {
    let store = Arc::new(MemoryStore::new());
    let repo = DocumentEntityRepository::new(Arc::clone(&store));
    (store, TripRecorder::new(repo))
}

async fn counts(store: &MemoryStore) -> (usize, usize, usize) {
    (
        store.count(Collection::Trips).await,
        store.count(Collection::Vehicles).await,
        store.count(Collection::Parties).await,
    )
}

#[tokio::test]
async fn test_first_trip_creates_aggregates_and_second_increments() {
    let (_store, recorder) = recorder();
    let repo = recorder.repository();

    let first = recorder
        .record(&draft(day(15), "MH12AB1234", "Acme Traders", "Beta Corp"))
        .await
        .unwrap();
    assert!(first.vehicle_created);
    assert_eq!(first.parties_created, vec!["Acme Traders", "Beta Corp"]);

    let vehicle = repo.find_vehicle("MH12AB1234").await.unwrap().unwrap();
    assert_eq!(vehicle.trip_count, 1);
    assert_eq!(vehicle.last_trip, day(15));

    let second = recorder
        .record(&draft(day(16), "MH12AB1234", "Acme Traders", "Gamma"))
        .await
        .unwrap();
    assert!(!second.vehicle_created);
    assert_eq!(second.parties_created, vec!["Gamma"]);
    assert_ne!(first.key, second.key);

    let vehicle = repo.find_vehicle("MH12AB1234").await.unwrap().unwrap();
    assert_eq!(vehicle.trip_count, 2);
    assert_eq!(vehicle.last_trip, day(16));

    let acme = repo.find_party("Acme Traders").await.unwrap().unwrap();
    assert_eq!(acme.trip_count, 2);
    let beta = repo.find_party("Beta Corp").await.unwrap().unwrap();
    assert_eq!(beta.trip_count, 1);
    assert_eq!(beta.last_trip, day(15));
}

#[tokio::test]
async fn test_trip_is_stored_with_all_routes() {
    let (_store, recorder) = recorder();
    let d = draft(day(16), " ka01 ab 9 ", " Acme Traders ", "Beta Corp")
        .with_route("Beta Corp", "Gamma");
    let recorded = recorder.record(&d).await.unwrap();

    let trip = recorder
        .repository()
        .get_trip(&recorded.key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(trip.vehicle_no, "KA01AB9");
    assert_eq!(trip.driver, "Ravi Kumar");
    assert_eq!(trip.routes.len(), 2);
    assert_eq!(trip.routes[0].from, "Acme Traders");
    assert!(recorded.key.starts_with("20261016_KA01AB9_"));

    // Only the first route feeds aggregation
    assert!(recorder.repository().find_party("Gamma").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_fields_fail_validation_without_writes() {
    let (store, recorder) = recorder();
    // Any store access would surface as a persistence error instead
    store.fail_queries(true).await;

    let cases = vec![
        (draft(day(16), "  ", "A", "B"), MissingField::VehicleNo),
        (
            TripDraft::new(day(16), " ", "KA01").with_route("A", "B"),
            MissingField::Driver,
        ),
        (TripDraft::new(day(16), "Ravi", "KA01"), MissingField::Routes),
        (draft(day(16), "KA01", "", "B"), MissingField::RouteFrom(0)),
        (draft(day(16), "KA01", "A", "B").with_route("B", "  "), MissingField::RouteTo(1)),
    ];

    for (d, expected) in cases {
        match recorder.record(&d).await {
            Err(RecordError::Validation(e)) => assert_eq!(e.missing_field, expected),
            other => panic!("expected validation error for {:?}, got {:?}", expected, other),
        }
    }

    store.fail_queries(false).await;
    assert_eq!(counts(&store).await, (0, 0, 0));
}

#[tokio::test]
async fn test_failed_commit_leaves_no_trace() {
    let (store, recorder) = recorder();
    recorder
        .record(&draft(day(15), "KA01", "Acme Traders", "Beta Corp"))
        .await
        .unwrap();

    store.fail_next_commit(CommitFailure::Reject).await;
    let err = recorder
        .record(&draft(day(16), "KA01", "Acme Traders", "Gamma"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RecordError::Persistence(PersistenceError::Commit(StoreError::Rejected(_)))
    ));

    assert_eq!(counts(&store).await, (1, 1, 2));
    let vehicle = recorder.repository().find_vehicle("KA01").await.unwrap().unwrap();
    assert_eq!(vehicle.trip_count, 1);
    assert_eq!(vehicle.last_trip, day(15));
    let acme = recorder.repository().find_party("Acme Traders").await.unwrap().unwrap();
    assert_eq!(acme.trip_count, 1);
}

#[tokio::test]
async fn test_vehicle_numbers_aggregate_case_insensitively() {
    let (store, recorder) = recorder();
    recorder
        .record(&draft(day(15), "mh12ab1234", "Acme Traders", "Beta Corp"))
        .await
        .unwrap();
    recorder
        .record(&draft(day(16), "MH12AB1234", "Acme Traders", "Beta Corp"))
        .await
        .unwrap();

    assert_eq!(store.count(Collection::Vehicles).await, 1);
    let vehicle = recorder.repository().find_vehicle("MH12AB1234").await.unwrap().unwrap();
    assert_eq!(vehicle.trip_count, 2);
}

#[tokio::test]
async fn test_same_origin_and_destination_counts_twice() {
    let (store, recorder) = recorder();
    let first = recorder
        .record(&draft(day(15), "KA01", "Acme Traders", "Acme Traders"))
        .await
        .unwrap();
    assert_eq!(first.parties_created, vec!["Acme Traders"]);
    recorder
        .record(&draft(day(16), "KA01", "Acme Traders", "Acme Traders"))
        .await
        .unwrap();

    assert_eq!(store.count(Collection::Parties).await, 1);
    let acme = recorder.repository().find_party("Acme Traders").await.unwrap().unwrap();
    assert_eq!(acme.trip_count, 4);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_first_sightings_do_not_lose_updates() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(10)));
    let recorder = TripRecorder::new(DocumentEntityRepository::new(Arc::clone(&store)));

    let a = draft(day(16), "KA01", "Acme Traders", "Beta Corp");
    let b = draft(day(16), "ka01", "Acme Traders", "Gamma");
    let (ra, rb) = tokio::join!(recorder.record(&a), recorder.record(&b));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    // Both saw the vehicle as new; exactly one created it
    assert!(ra.vehicle_created ^ rb.vehicle_created);
    assert_eq!(store.count(Collection::Trips).await, 2);
    assert_eq!(store.count(Collection::Vehicles).await, 1);

    let repo = recorder.repository();
    assert_eq!(repo.find_vehicle("KA01").await.unwrap().unwrap().trip_count, 2);
    assert_eq!(repo.find_party("Acme Traders").await.unwrap().unwrap().trip_count, 2);
    assert_eq!(repo.find_party("Gamma").await.unwrap().unwrap().trip_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_trips_for_one_vehicle_counts_every_trip() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(10)));
    let recorder = TripRecorder::new(DocumentEntityRepository::new(Arc::clone(&store)));

    let drafts: Vec<_> = (0..5)
        .map(|_| draft(day(17), "TN09 X 4411", "Chennai Port", "Acme Traders"))
        .collect();
    let results = join_all(drafts.iter().map(|d| recorder.record(d))).await;

    let recorded: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(recorded.iter().filter(|r| r.vehicle_created).count(), 1);
    assert_eq!(counts(&store).await, (5, 1, 2));

    let repo = recorder.repository();
    assert_eq!(repo.find_vehicle("TN09X4411").await.unwrap().unwrap().trip_count, 5);
    assert_eq!(repo.find_party("Chennai Port").await.unwrap().unwrap().trip_count, 5);
}

#[tokio::test]
async fn test_recorders_sharing_a_store_directory_keep_every_trip() {
    let dir = tempdir().unwrap();
    let first = TripRecorder::new(open_file_repository_at(dir.path().to_path_buf()).unwrap());
    // Opened before the first trip exists, so its lookups start out stale
    let second = TripRecorder::new(open_file_repository_at(dir.path().to_path_buf()).unwrap());

    let a = first.record(&draft(day(16), "KA01", "Acme Traders", "Beta Corp")).await.unwrap();
    let b = second.record(&draft(day(17), "KA01", "Acme Traders", "Gamma")).await.unwrap();
    assert!(a.vehicle_created);
    assert!(!b.vehicle_created);
    assert_eq!(b.parties_created, vec!["Gamma".to_string()]);

    let repo = open_file_repository_at(dir.path().to_path_buf()).unwrap();
    assert!(repo.get_trip(&a.key).await.unwrap().is_some());
    assert!(repo.get_trip(&b.key).await.unwrap().is_some());
    let vehicle = repo.find_vehicle("KA01").await.unwrap().unwrap();
    assert_eq!(vehicle.trip_count, 2);
    assert_eq!(vehicle.last_trip, day(17));
    assert_eq!(repo.find_party("Acme Traders").await.unwrap().unwrap().trip_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_conflict_without_retries_is_a_commit_error() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(10)));
    let recorder = TripRecorder::new(DocumentEntityRepository::new(Arc::clone(&store)))
        .with_conflict_retries(0);

    let a = draft(day(16), "KA01", "Acme Traders", "Beta Corp");
    let (ra, rb) = tokio::join!(recorder.record(&a), recorder.record(&a));

    let errors: Vec<_> = [ra, rb].into_iter().filter_map(Result::err).collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        RecordError::Persistence(PersistenceError::Commit(e)) if e.is_conflict()
    ));
    assert_eq!(store.count(Collection::Trips).await, 1);
}

#[tokio::test]
async fn test_lost_ack_is_confirmed_by_read_back() {
    let (store, recorder) = recorder();
    store.fail_next_commit(CommitFailure::LoseAck).await;

    let recorded = recorder
        .record(&draft(day(16), "KA01", "Acme Traders", "Beta Corp"))
        .await
        .unwrap();
    assert!(recorded.verified_by_read_back);
    assert_eq!(counts(&store).await, (1, 1, 2));
}

#[tokio::test]
async fn test_lookup_failure_is_persistence_error() {
    let (store, recorder) = recorder();
    store.fail_queries(true).await;
    let err = recorder
        .record(&draft(day(16), "KA01", "Acme Traders", "Beta Corp"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::Persistence(PersistenceError::Lookup(_))));
}

/// Repository whose commits never get acknowledged
struct UnacknowledgedRepository {
    trip_applied: bool,
    read_back_fails: bool,
}

#[async_trait]
impl EntityRepository for UnacknowledgedRepository {
    async fn get_trip(&self, _key: &str) -> Result<Option<Trip>, StoreError> {
        if self.read_back_fails {
            return Err(StoreError::Unavailable("offline".to_string()));
        }
        if self.trip_applied {
            let d = draft(day(16), "KA01", "A", "B");
            return Ok(Some(Trip::from_draft(&d, "k".to_string(), chrono::Utc::now())));
        }
        Ok(None)
    }

    async fn find_vehicle(&self, _number: &str) -> Result<Option<Vehicle>, StoreError> {
        Ok(None)
    }

    async fn find_party(&self, _name: &str) -> Result<Option<Party>, StoreError> {
        Ok(None)
    }

    async fn search_parties(&self, _prefix: &str, _limit: usize) -> Result<Vec<Party>, StoreError> {
        Ok(Vec::new())
    }

    async fn list_vehicles(&self, _limit: Option<usize>) -> Result<Vec<Vehicle>, StoreError> {
        Ok(Vec::new())
    }

    async fn list_parties(&self, _limit: Option<usize>) -> Result<Vec<Party>, StoreError> {
        Ok(Vec::new())
    }

    async fn trips_for_vehicle(&self, _number: &str) -> Result<Vec<Trip>, StoreError> {
        Ok(Vec::new())
    }

    async fn trips_for_party(&self, _name: &str) -> Result<Vec<Trip>, StoreError> {
        Ok(Vec::new())
    }

    async fn commit(&self, _batch: EntityBatch) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_lost_ack_with_absent_trip_is_commit_error() {
    let recorder = TripRecorder::new(UnacknowledgedRepository {
        trip_applied: false,
        read_back_fails: false,
    });
    let err = recorder
        .record(&draft(day(16), "KA01", "A", "B"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RecordError::Persistence(PersistenceError::Commit(StoreError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_lost_ack_with_failed_read_back_is_indeterminate() {
    let recorder = TripRecorder::new(UnacknowledgedRepository {
        trip_applied: true,
        read_back_fails: true,
    });
    let err = recorder
        .record(&draft(day(16), "KA01", "A", "B"))
        .await
        .unwrap_err();
    match err {
        RecordError::Persistence(PersistenceError::Indeterminate { trip_key, .. }) => {
            assert!(trip_key.starts_with("20261016_KA01_"));
        }
        other => panic!("expected indeterminate outcome, got {:?}", other),
    }
}
