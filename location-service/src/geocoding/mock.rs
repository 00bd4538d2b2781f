//! Mock geocoder for testing without API access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::Coordinates;

use super::error::GeocodingError;
use super::types::GeocodedAddress;
use super::Geocoder;

#[derive(Default)]
struct MockState {
    failing: AtomicBool,
    reverse_calls: AtomicUsize,
    forward_calls: AtomicUsize,
    delay: Mutex<Duration>,
    places: Mutex<HashMap<String, GeocodedAddress>>,
}

/// Mock geocoder.
///
/// Reverse lookups answer `"Near {lat},{lon}"`. Forward lookups answer
/// from places registered with [`MockGeocoder::add_place`]. Clones share
/// state, so a test can keep a handle to inspect call counts.
#[derive(Clone, Default)]
pub struct MockGeocoder {
    state: Arc<MockState>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A geocoder whose every lookup fails.
    pub fn failing() -> Self {
        let mock = Self::new();
        mock.set_failing(true);
        mock
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every lookup, to simulate a slow endpoint.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Register a forward-lookup answer.
    pub fn add_place(&self, query: &str, found: GeocodedAddress) {
        self.state
            .places
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(normalize(query), found);
    }

    pub fn reverse_calls(&self) -> usize {
        self.state.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn forward_calls(&self) -> usize {
        self.state.forward_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) -> Result<(), GeocodingError> {
        let delay = *self.state.delay.lock().unwrap_or_else(|e| e.into_inner());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(GeocodingError::Status {
                status: "UNKNOWN_ERROR".to_string(),
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl Geocoder for MockGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<String, GeocodingError> {
        self.state.reverse_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await?;
        Ok(format!("Near {coordinates}"))
    }

    async fn forward(&self, query: &str) -> Result<GeocodedAddress, GeocodingError> {
        self.state.forward_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await?;
        self.state
            .places
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&normalize(query))
            .cloned()
            .ok_or(GeocodingError::NoResults)
    }
}
