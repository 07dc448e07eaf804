//! In-memory table set shared by the store engines

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use triplog_types::StoreError;

use crate::batch::as_counter;
use crate::{Collection, Document, Fields, StoreResult, WriteBatch, WriteOp};

pub(crate) type Table = BTreeMap<String, Fields>;

/// Every collection of a store, serialized as one object keyed by collection name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Tables {
    tables: BTreeMap<Collection, Table>,
}

impl Tables {
    pub fn table(&self, collection: Collection) -> Option<&Table> {
        self.tables.get(&collection)
    }

    pub fn get(&self, collection: Collection, key: &str) -> Option<Document> {
        self.table(collection)?
            .get(key)
            .map(|fields| Document::new(key, fields.clone()))
    }

    pub fn query_equals(&self, collection: Collection, field: &str, value: &Value) -> Vec<Document> {
        self.documents(collection)
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .map(|(key, fields)| Document::new(key.clone(), fields.clone()))
            .collect()
    }

    pub fn query_prefix(
        &self,
        collection: Collection,
        field: &str,
        prefix: &str,
        limit: usize,
    ) -> Vec<Document> {
        let mut matches: Vec<(&str, &String, &Fields)> = self
            .documents(collection)
            .filter_map(|(key, fields)| {
                let value = fields.get(field)?.as_str()?;
                value.starts_with(prefix).then_some((value, key, fields))
            })
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
        matches
            .into_iter()
            .take(limit)
            .map(|(_, key, fields)| Document::new(key.clone(), fields.clone()))
            .collect()
    }

    pub fn list(
        &self,
        collection: Collection,
        order_by: &str,
        descending: bool,
        limit: Option<usize>,
    ) -> Vec<Document> {
        let mut docs: Vec<(&String, &Fields)> = self.documents(collection).collect();
        docs.sort_by(|a, b| {
            let ord = compare_values(a.1.get(order_by), b.1.get(order_by), descending);
            ord.then_with(|| a.0.cmp(b.0))
        });
        docs.into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, fields)| Document::new(key.clone(), fields.clone()))
            .collect()
    }

    /// Apply every op of the batch in order. On error `self` may hold a
    /// partial result, so callers apply to a staged copy.
    pub fn apply(&mut self, batch: &WriteBatch) -> StoreResult<BTreeSet<Collection>> {
        let mut touched = BTreeSet::new();
        for op in batch.ops() {
            let collection = op.collection();
            let table = self.tables.entry(collection).or_default();
            match op {
                WriteOp::Create { key, fields, .. } => {
                    if table.contains_key(key) {
                        return Err(conflict(collection, key));
                    }
                    table.insert(key.clone(), fields.clone());
                }
                WriteOp::Increment {
                    key,
                    field,
                    delta,
                    set,
                    ..
                } => {
                    let doc = table.get_mut(key).ok_or_else(|| conflict(collection, key))?;
                    let current = as_counter(doc.get(field)).ok_or_else(|| {
                        StoreError::Rejected(format!(
                            "{}/{} field '{}' is not an integer",
                            collection, key, field
                        ))
                    })?;
                    doc.insert(field.clone(), Value::from(current + delta));
                    for (name, value) in set {
                        doc.insert(name.clone(), value.clone());
                    }
                }
            }
            touched.insert(collection);
        }
        Ok(touched)
    }

    fn documents(&self, collection: Collection) -> impl Iterator<Item = (&String, &Fields)> {
        self.tables.get(&collection).into_iter().flat_map(|t| t.iter())
    }
}

fn conflict(collection: Collection, key: &str) -> StoreError {
    StoreError::Conflict {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

/// Order two optional field values; missing or null values always sort last
fn compare_values(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = match (a, b) {
                (Value::Number(x), Value::Number(y)) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
                (Value::String(x), Value::String(y)) => x.cmp(y),
                _ => a.to_string().cmp(&b.to_string()),
            };
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}
