//! Domain layer for trip recording
//!
//! Trips are the source records. Vehicles and parties are aggregates
//! denormalized from the first route segment of each trip.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{Party, RouteSegment, Trip, TripDraft, Vehicle};
pub use repository::{EntityBatch, EntityRepository, EntityWrite};
pub use service::{
    normalize_party_name, normalize_vehicle_no, validate, MissingField, TripKeyGenerator,
    ValidationError,
};
