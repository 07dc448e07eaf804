//! Domain model types

pub mod aggregate;
pub mod trip;

pub use aggregate::{Party, Vehicle};
pub use trip::{RouteSegment, Trip, TripDraft};
