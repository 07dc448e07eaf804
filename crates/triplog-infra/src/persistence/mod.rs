//! Persistence implementations
//!
//! This module provides document-store implementations of the repository traits.

mod document_entity_repo;

pub use document_entity_repo::DocumentEntityRepository;
