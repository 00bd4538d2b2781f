//! Domain types for the location service.
//!
//! All types enforce their invariants at construction time, so code that
//! receives these types can trust their validity.

mod error;
mod position;
mod station;

pub use error::DomainError;
pub use position::{Coordinates, Position};
pub use station::{FuelType, Station};
