//! Application state for the web layer.

use crate::clock::{Clock, SystemClock};
use crate::service::LocationService;
use crate::stations::StationDirectory;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<S, G, C = SystemClock> {
    /// The location service owning the current position
    pub location: LocationService<S, G, C>,

    /// Station list used for nearby queries
    pub stations: StationDirectory,
}

impl<S, G, C> Clone for AppState<S, G, C> {
    fn clone(&self) -> Self {
        Self {
            location: self.location.clone(),
            stations: self.stations.clone(),
        }
    }
}

impl<S, G, C: Clock> AppState<S, G, C> {
    /// Create a new app state.
    pub fn new(location: LocationService<S, G, C>, stations: StationDirectory) -> Self {
        Self { location, stations }
    }
}
