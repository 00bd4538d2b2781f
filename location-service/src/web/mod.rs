//! HTTP surface of the location daemon.
//!
//! Exposes the current position, manual refresh and address search, and
//! nearby stations ranked from the current position.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
