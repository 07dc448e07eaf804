//! Application service layer - trip recording, name suggestions, queries, config

pub mod app;
pub mod config;
pub mod repository;

pub use app::name_suggester::{Direction, FieldKey, NameSuggester};
pub use app::trip_recorder::{PersistenceError, RecordError, RecordedTrip, TripRecorder};
pub use config::Config;
