//! Domain services

pub mod trip_key;
pub mod validation;

pub use trip_key::TripKeyGenerator;
pub use validation::{normalize_party_name, normalize_vehicle_no, validate, MissingField, ValidationError};
