//! Positioning sensor abstraction.
//!
//! A sensor is consumed in two modes:
//! - a one-shot read, used for manual refreshes (high accuracy, no cached
//!   fix, bounded by a timeout)
//! - a continuous watch, used for background updates (low accuracy, may
//!   reuse a recent fix, no timeout; a hung watch simply stops producing)

mod error;
mod lines;
mod mock;

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::Coordinates;

pub use error::SensorError;
pub use lines::{LineSensor, parse_fix};
pub use mock::MockSensor;

/// Buffer size for watch channels.
pub(crate) const WATCH_BUFFER: usize = 16;

/// A raw fix from the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub coordinates: Coordinates,
    /// Estimated horizontal accuracy in metres, if the sensor reports one.
    pub accuracy_m: Option<f64>,
}

impl SensorReading {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, metres: f64) -> Self {
        self.accuracy_m = Some(metres);
        self
    }
}

/// Requested accuracy of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    /// Best available (e.g. satellite); slower and more power hungry.
    High,
    /// Coarse (e.g. network based); cheap.
    Low,
}

/// Options for a one-shot read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub accuracy: Accuracy,
    /// Deadline for the fix.
    pub timeout: Duration,
    /// Oldest cached fix the sensor may return instead of a new one.
    pub max_age: Duration,
}

impl ReadOptions {
    /// High accuracy, no cached fixes.
    pub fn high_accuracy(timeout: Duration) -> Self {
        Self {
            accuracy: Accuracy::High,
            timeout,
            max_age: Duration::ZERO,
        }
    }

    /// Low accuracy, cached fixes up to `max_age` allowed.
    pub fn low_accuracy(timeout: Duration, max_age: Duration) -> Self {
        Self {
            accuracy: Accuracy::Low,
            timeout,
            max_age,
        }
    }
}

/// Options for a continuous watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub accuracy: Accuracy,
    /// Hint for how old a cached fix may be.
    pub max_age: Duration,
}

impl WatchOptions {
    /// Low-accuracy watch used for background updates.
    pub fn passive(max_age: Duration) -> Self {
        Self {
            accuracy: Accuracy::Low,
            max_age,
        }
    }
}

/// Stream of readings from a watch. Dropping it releases the watch.
pub type WatchReceiver = mpsc::Receiver<Result<SensorReading, SensorError>>;

/// A source of position fixes.
///
/// This abstraction allows the location service to be tested with
/// scripted fixes.
pub trait PositionSensor: Send + Sync + 'static {
    /// Take a single fix.
    fn read_once(
        &self,
        options: ReadOptions,
    ) -> impl Future<Output = Result<SensorReading, SensorError>> + Send;

    /// Start a continuous watch.
    ///
    /// Readings are delivered in the order the sensor produces them. The
    /// watch ends when the receiver is dropped.
    fn watch(&self, options: WatchOptions) -> WatchReceiver;
}
