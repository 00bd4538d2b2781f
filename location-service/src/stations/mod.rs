//! Backend station list client and in-memory directory.
//!
//! The station list is fetched from the backend data API at startup and
//! refreshed periodically. This crate only ever reads it.

mod client;
mod directory;
mod error;

pub use client::{StationClient, StationClientConfig, StationDto};
pub use directory::StationDirectory;
pub use error::StationError;
