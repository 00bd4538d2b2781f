//! Scriptable sensor for testing without positioning hardware.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::error::SensorError;
use super::{PositionSensor, ReadOptions, SensorReading, WATCH_BUFFER, WatchOptions, WatchReceiver};

type Fix = Result<SensorReading, SensorError>;

#[derive(Default)]
struct MockState {
    /// Queued results for `read_once`, consumed front-first.
    fixes: VecDeque<Fix>,
    /// Senders for every watch that has been started.
    watchers: Vec<mpsc::Sender<Fix>>,
    read_requests: Vec<ReadOptions>,
    watch_requests: Vec<WatchOptions>,
}

/// Mock sensor driven by the test.
///
/// One-shot reads pop queued fixes; with an empty queue the read never
/// completes, like a sensor that cannot get a fix. Watch readings are
/// pushed with [`MockSensor::emit`].
#[derive(Clone, Default)]
pub struct MockSensor {
    state: Arc<Mutex<MockState>>,
}

impl MockSensor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue the result of the next one-shot read.
    pub fn push_fix(&self, fix: Fix) {
        self.lock().fixes.push_back(fix);
    }

    /// Send a reading (or error) to every live watch.
    ///
    /// Returns how many watches received it.
    pub async fn emit(&self, fix: Fix) -> usize {
        let senders: Vec<_> = {
            let mut state = self.lock();
            state.watchers.retain(|tx| !tx.is_closed());
            state.watchers.clone()
        };

        let mut delivered = 0;
        for tx in senders {
            if tx.send(fix.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of watches whose receiver is still alive.
    pub fn active_watches(&self) -> usize {
        self.lock().watchers.iter().filter(|tx| !tx.is_closed()).count()
    }

    /// Options passed to every `read_once` call so far.
    pub fn read_requests(&self) -> Vec<ReadOptions> {
        self.lock().read_requests.clone()
    }

    /// Options passed to every `watch` call so far.
    pub fn watch_requests(&self) -> Vec<WatchOptions> {
        self.lock().watch_requests.clone()
    }
}

impl PositionSensor for MockSensor {
    async fn read_once(&self, options: ReadOptions) -> Result<SensorReading, SensorError> {
        let next = {
            let mut state = self.lock();
            state.read_requests.push(options);
            state.fixes.pop_front()
        };

        match next {
            Some(fix) => fix,
            None => std::future::pending().await,
        }
    }

    fn watch(&self, options: WatchOptions) -> WatchReceiver {
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let mut state = self.lock();
        state.watch_requests.push(options);
        state.watchers.push(tx);
        rx
    }
}
