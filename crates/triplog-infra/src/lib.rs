//! Infrastructure layer - repository implementations over the document store

pub mod persistence;

pub use persistence::DocumentEntityRepository;
