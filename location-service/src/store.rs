//! Disk-based cache for the last known position.
//!
//! A single JSON file holds the most recently accepted position. It is read
//! once at startup and rewritten on every accepted update. Reading is
//! forgiving: a missing, unreadable, corrupt, invalid or stale entry is
//! treated as absent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Coordinates, Position};

/// Errors writing the position cache.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create cache directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write cache file: {0}")]
    Write(#[source] std::io::Error),
}

/// On-disk representation of a position.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedPosition {
    latitude: f64,
    longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    /// Unix epoch milliseconds.
    observed_at: i64,
}

impl From<&Position> for CachedPosition {
    fn from(position: &Position) -> Self {
        Self {
            latitude: position.latitude(),
            longitude: position.longitude(),
            address: position.address().map(str::to_string),
            observed_at: position.observed_at().timestamp_millis(),
        }
    }
}

impl CachedPosition {
    fn into_position(self) -> Option<Position> {
        let coordinates = Coordinates::new(self.latitude, self.longitude).ok()?;
        let observed_at: DateTime<Utc> = Utc.timestamp_millis_opt(self.observed_at).single()?;
        let position = Position::new(coordinates, observed_at);
        Some(match self.address {
            Some(address) => position.with_address(address),
            None => position,
        })
    }
}

/// Single-entry disk cache for the last known position.
#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the cached position, if it exists and is younger than `max_age`.
    pub fn load(&self, now: DateTime<Utc>, max_age: Duration) -> Option<Position> {
        let position = self.load_any()?;
        if !position.is_fresh(now, max_age) {
            debug!(
                path = %self.path.display(),
                observed_at = %position.observed_at(),
                "discarding stale cached position"
            );
            return None;
        }
        Some(position)
    }

    /// Load the cached position regardless of age.
    pub fn load_any(&self) -> Option<Position> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let cached: CachedPosition = serde_json::from_str(&contents).ok()?;
        cached.into_position()
    }

    /// Save a position, replacing any previous entry.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, position: &Position) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
        }

        // Write beside the target, then rename over it
        let json = serde_json::to_string(&CachedPosition::from(position))?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json).map_err(StoreError::Write)?;
        std::fs::rename(&tmp, &self.path).map_err(StoreError::Write)?;

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
