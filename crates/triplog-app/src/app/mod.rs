//! Use cases

pub mod name_suggester;
pub mod query_service;
pub mod trip_recorder;
