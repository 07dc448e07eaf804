//! Write batches

use serde_json::Value;
use uuid::Uuid;

use crate::{Collection, Fields};

/// A single write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create a document. Fails the batch if the key already exists.
    Create {
        collection: Collection,
        key: String,
        fields: Fields,
    },
    /// Add `delta` to an integer field and merge `set` into the document.
    /// Fails the batch if the document does not exist.
    Increment {
        collection: Collection,
        key: String,
        field: String,
        delta: i64,
        set: Fields,
    },
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Create { collection, .. } | WriteOp::Increment { collection, .. } => {
                *collection
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            WriteOp::Create { key, .. } | WriteOp::Increment { key, .. } => key,
        }
    }
}

/// Ordered set of writes committed atomically by a store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a create. `None` generates a random key. Returns the key used.
    pub fn upsert_create(
        &mut self,
        collection: Collection,
        key: Option<String>,
        fields: Fields,
    ) -> String {
        let key = key.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        self.ops.push(WriteOp::Create {
            collection,
            key: key.clone(),
            fields,
        });
        key
    }

    /// Queue a counter increment with extra fields to overwrite
    pub fn upsert_increment(
        &mut self,
        collection: Collection,
        key: impl Into<String>,
        field: impl Into<String>,
        delta: i64,
        set: Fields,
    ) {
        self.ops.push(WriteOp::Increment {
            collection,
            key: key.into(),
            field: field.into(),
            delta,
            set,
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

pub(crate) fn as_counter(value: Option<&Value>) -> Option<i64> {
    match value {
        None | Some(Value::Null) => Some(0),
        Some(v) => v.as_i64(),
    }
}
