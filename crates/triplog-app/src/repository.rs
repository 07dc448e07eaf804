//! Repository adapters for the persistence layer

use std::path::PathBuf;

use triplog_infra::DocumentEntityRepository;
use triplog_store::{JsonFileStore, MemoryStore};
use triplog_types::Result;

use crate::config::Config;

pub type FileRepository = DocumentEntityRepository<JsonFileStore>;

/// Open the file-backed repository in the configured store directory
pub fn open_file_repository(config: &Config) -> Result<FileRepository> {
    let store_dir = config.store_dir()?;
    open_file_repository_at(store_dir)
}

/// Open the file-backed repository at a custom directory
pub fn open_file_repository_at(store_dir: PathBuf) -> Result<FileRepository> {
    let store = JsonFileStore::open(store_dir)?;
    Ok(DocumentEntityRepository::new(store))
}

/// Repository that lives only for the current process
pub fn open_memory_repository() -> DocumentEntityRepository<MemoryStore> {
    DocumentEntityRepository::new(MemoryStore::new())
}
