//! In-memory store engine

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use triplog_types::StoreError;

use crate::tables::Tables;
use crate::{Collection, Document, DocumentStore, StoreResult, WriteBatch};

/// Failure to inject into the next commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitFailure {
    /// Refuse the batch; nothing is applied
    Reject,
    /// Apply the batch, then report the connection as lost
    LoseAck,
}

#[derive(Debug, Default)]
struct Faults {
    next_commit: Option<CommitFailure>,
    fail_queries: bool,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    faults: Faults,
}

/// Store kept entirely in memory
///
/// Commits are staged on a copy of the tables and swapped in only when every
/// op succeeded. An optional latency is awaited before each call, which lets
/// tests interleave concurrent callers under a paused clock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next commit fail in the given way
    pub async fn fail_next_commit(&self, failure: CommitFailure) {
        self.state.write().await.faults.next_commit = Some(failure);
    }

    /// Make every read fail until switched off
    pub async fn fail_queries(&self, fail: bool) {
        self.state.write().await.faults.fail_queries = fail;
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.state
            .read()
            .await
            .tables
            .table(collection)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn read_state(&self) -> StoreResult<tokio::sync::RwLockReadGuard<'_, State>> {
        self.delay().await;
        let state = self.state.read().await;
        if state.faults.fail_queries {
            return Err(StoreError::Unavailable("injected query failure".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Document>> {
        Ok(self.read_state().await?.tables.get(collection, key))
    }

    async fn query_equals(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .read_state()
            .await?
            .tables
            .query_equals(collection, field, value))
    }

    async fn query_prefix(
        &self,
        collection: Collection,
        field: &str,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .read_state()
            .await?
            .tables
            .query_prefix(collection, field, prefix, limit))
    }

    async fn list(
        &self,
        collection: Collection,
        order_by: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .read_state()
            .await?
            .tables
            .list(collection, order_by, descending, limit))
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.delay().await;
        let mut state = self.state.write().await;
        let failure = state.faults.next_commit.take();
        if failure == Some(CommitFailure::Reject) {
            return Err(StoreError::Rejected("injected commit failure".to_string()));
        }

        let mut staged = state.tables.clone();
        staged.apply(&batch)?;
        state.tables = staged;
        debug!(ops = batch.len(), "memory store committed batch");

        if failure == Some(CommitFailure::LoseAck) {
            return Err(StoreError::Unavailable(
                "connection lost before acknowledgement".to_string(),
            ));
        }
        Ok(())
    }
}
