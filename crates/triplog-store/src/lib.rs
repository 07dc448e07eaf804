//! Document store for trips, vehicles and parties
//!
//! The store is a set of keyed collections of JSON documents. Reads are
//! point lookups, equality queries and prefix range scans; writes only go
//! through [`WriteBatch`], which a store commits all-or-nothing.

mod batch;
mod file;
mod memory;
mod tables;

pub use batch::{WriteBatch, WriteOp};
pub use file::JsonFileStore;
pub use memory::{CommitFailure, MemoryStore};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use triplog_types::StoreError;

/// Field map of a document
pub type Fields = Map<String, Value>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Collections known to the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Trips,
    Vehicles,
    Parties,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Trips, Collection::Vehicles, Collection::Parties];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Trips => "trips",
            Collection::Vehicles => "vehicles",
            Collection::Parties => "parties",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(key: impl Into<String>, fields: Fields) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// String value of a field, if present and a string
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Integer value of a field, if present and an integer
    pub fn i64_field(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }
}

/// Contract every store engine implements
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup by key
    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Document>>;

    /// Documents whose `field` equals `value`, ordered by key
    async fn query_equals(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>>;

    /// Documents whose string `field` starts with `prefix`, ordered by that
    /// field, at most `limit` of them
    async fn query_prefix(
        &self,
        collection: Collection,
        field: &str,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    /// All documents ordered by `order_by` (documents missing the field last)
    async fn list(
        &self,
        collection: Collection,
        order_by: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>>;

    /// Start an empty write batch
    fn begin_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply every op in the batch, or none of them
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Document>> {
        (**self).get(collection, key).await
    }

    async fn query_equals(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        (**self).query_equals(collection, field, value).await
    }

    async fn query_prefix(
        &self,
        collection: Collection,
        field: &str,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        (**self).query_prefix(collection, field, prefix, limit).await
    }

    async fn list(
        &self,
        collection: Collection,
        order_by: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        (**self).list(collection, order_by, descending, limit).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        (**self).commit(batch).await
    }
}
