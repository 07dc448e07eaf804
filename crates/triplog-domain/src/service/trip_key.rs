//! Trip key generation
//!
//! Keys read `{yyyymmdd}_{VEHICLE}_{unix_millis}-{seq}-{rand}`. The sequence
//! separates keys minted in the same millisecond by one process, the random
//! suffix separates processes.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct TripKeyGenerator {
    seq: AtomicU64,
}

impl TripKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `vehicle_no` is expected to be normalized already
    pub fn generate(&self, date: NaiveDate, vehicle_no: &str, at: DateTime<Utc>) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let rand = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}-{:04}-{}",
            date.format("%Y%m%d"),
            vehicle_no,
            at.timestamp_millis(),
            seq,
            &rand[..8]
        )
    }
}
