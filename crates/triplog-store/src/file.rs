//! JSON file store engine
//!
//! Every collection lives in one `store.json` under the store directory, so
//! a commit is a single write-to-tmp, fsync, rename. Commits hold an
//! exclusive lock on `store.lock` and apply the batch to the file as it is on
//! disk, so several handles on one directory never overwrite each other.
//! Reads are served from the snapshot taken at open or at the last commit.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use triplog_types::StoreError;

use crate::tables::Tables;
use crate::{Collection, Document, DocumentStore, StoreResult, WriteBatch};

const STORE_FILE: &str = "store.json";
const TMP_FILE: &str = ".store.json.tmp";
const LOCK_FILE: &str = "store.lock";

/// File-backed implementation of DocumentStore
pub struct JsonFileStore {
    store_dir: PathBuf,
    tables: RwLock<Tables>,
}

impl JsonFileStore {
    /// Create or load a store in `store_dir`
    pub fn open(store_dir: PathBuf) -> StoreResult<Self> {
        fs::create_dir_all(&store_dir)?;
        let tables = load_tables(&store_dir.join(STORE_FILE))?;

        debug!(dir = %store_dir.display(), "opened json file store");
        Ok(Self {
            store_dir,
            tables: RwLock::new(tables),
        })
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    fn store_path(&self) -> PathBuf {
        self.store_dir.join(STORE_FILE)
    }

    /// Replace `store.json` in one rename. The tmp file is removed on failure.
    fn save(&self, tables: &Tables) -> StoreResult<()> {
        let tmp = self.store_dir.join(TMP_FILE);
        let result = write_synced(&tmp, tables)
            .and_then(|()| fs::rename(&tmp, self.store_path()).map_err(StoreError::from));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}

fn load_tables(path: &Path) -> StoreResult<Tables> {
    if !path.exists() {
        return Ok(Tables::default());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| StoreError::Corrupted(format!("{}: {}", path.display(), e)))
}

fn write_synced(path: &Path, tables: &Tables) -> StoreResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, tables)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Exclusive lock on the store directory, released when dropped
struct StoreLock {
    _file: File,
}

impl StoreLock {
    fn acquire(store_dir: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(store_dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get(&self, collection: Collection, key: &str) -> StoreResult<Option<Document>> {
        Ok(self.tables.read().await.get(collection, key))
    }

    async fn query_equals(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        Ok(self.tables.read().await.query_equals(collection, field, value))
    }

    async fn query_prefix(
        &self,
        collection: Collection,
        field: &str,
        prefix: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        Ok(self
            .tables
            .read()
            .await
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
            .tables
            .read()
            .await
            .list(collection, order_by, descending, limit))
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let _lock = StoreLock::acquire(&self.store_dir)?;

        // Other handles may have committed since this snapshot was taken.
        // Refresh it even if the batch then fails, so a retry sees their writes.
        let mut staged = load_tables(&self.store_path())?;
        *tables = staged.clone();

        let touched = staged.apply(&batch)?;
        self.save(&staged)?;

        *tables = staged;
        debug!(ops = batch.len(), collections = touched.len(), "json file store committed batch");
        Ok(())
    }
}
