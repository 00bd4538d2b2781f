//! In-memory station directory.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::client::StationClient;
use super::error::StationError;
use crate::domain::Station;

/// Thread-safe station list with support for background refresh.
#[derive(Clone)]
pub struct StationDirectory {
    inner: Arc<RwLock<Vec<Station>>>,
    client: StationClient,
}

impl StationDirectory {
    /// Create a directory by fetching from the backend.
    ///
    /// This will fail if the backend is unreachable.
    pub async fn fetch(client: StationClient) -> Result<Self, StationError> {
        let stations = client.fetch_stations().await?;
        Ok(Self::new(client, stations))
    }

    /// Create a directory with a known station list.
    pub fn new(client: StationClient, stations: Vec<Station>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(stations)),
            client,
        }
    }

    /// Create an empty directory, to be filled by [`StationDirectory::refresh`].
    pub fn empty(client: StationClient) -> Self {
        Self::new(client, Vec::new())
    }

    /// Run `f` against the current station list.
    pub async fn read<R>(&self, f: impl FnOnce(&[Station]) -> R) -> R {
        let guard = self.inner.read().await;
        f(&guard)
    }

    /// Get the number of stations.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the directory is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Refresh the station list from the backend.
    ///
    /// On success, replaces the current list. On failure, the existing
    /// list is preserved and the error is returned.
    pub async fn refresh(&self) -> Result<usize, StationError> {
        let stations = self.client.fetch_stations().await?;
        let count = stations.len();

        let mut guard = self.inner.write().await;
        *guard = stations;

        Ok(count)
    }
}
