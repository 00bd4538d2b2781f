//! The location service.
//!
//! Maintains the user's best-known position with as few sensor reads,
//! geocoding calls and cache writes as possible:
//!
//! - At construction, a cached position is restored if it is still fresh.
//! - [`LocationService::start_watch`] starts the passive watch. Its
//!   readings go through the [`UpdateGate`]; accepted readings are
//!   reverse-geocoded (best effort), persisted and published.
//! - [`LocationService::refresh_now`] and [`LocationService::set_position`]
//!   bypass the gate.
//!
//! All mutable state sits behind one mutex that is never held across an
//! await point, so each acceptance or failure step is atomic. Acceptances
//! are numbered; an acceptance whose address lookup finishes after a newer
//! one has already published is discarded.

mod config;
mod error;
mod gate;
mod observers;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::domain::{Coordinates, Position};
use crate::geocoding::Geocoder;
use crate::sensor::{
    PositionSensor, ReadOptions, SensorError, SensorReading, WatchOptions, WatchReceiver,
};
use crate::store::PositionStore;

pub use config::LocationConfig;
pub use error::LocationError;
pub use gate::{GateDecision, UpdateGate};
pub use observers::{LocationEvent, Subscription};

use observers::Observers;

/// Mutable service state.
#[derive(Debug, Default)]
struct State {
    position: Option<Position>,
    /// Time of the last acceptance in this process.
    last_accepted_at: Option<DateTime<Utc>>,
    /// Sensor reads and address lookups in progress.
    in_flight: usize,
    last_error: Option<LocationError>,
    /// Sequence number handed to the most recent acceptance.
    accepted_seq: u64,
    /// Sequence number of the published position (0 for a cached one).
    published_seq: u64,
}

/// Permission to publish, handed out by an acceptance.
#[derive(Debug, Clone, Copy)]
struct Ticket {
    seq: u64,
    accepted_at: DateTime<Utc>,
}

/// Marks an operation as in flight until dropped.
struct InFlight<'a> {
    state: &'a Mutex<State>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

struct Inner<S, G, C> {
    sensor: S,
    geocoder: G,
    clock: C,
    store: Option<PositionStore>,
    config: LocationConfig,
    gate: UpdateGate,
    state: Mutex<State>,
    /// Serializes publishing, so persistence and notification follow the
    /// same order as the position itself.
    publishing: Mutex<()>,
    observers: Observers,
}

/// Tracks the user's position.
///
/// Cloning is cheap; clones share the same state.
pub struct LocationService<S, G, C = SystemClock> {
    inner: Arc<Inner<S, G, C>>,
}

impl<S, G, C> Clone for LocationService<S, G, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PositionSensor, G: Geocoder> LocationService<S, G, SystemClock> {
    /// Create a service using the system clock.
    pub fn new(
        sensor: S,
        geocoder: G,
        config: LocationConfig,
        store: Option<PositionStore>,
    ) -> Self {
        Self::with_clock(sensor, geocoder, config, store, SystemClock)
    }
}

impl<S: PositionSensor, G: Geocoder, C: Clock> LocationService<S, G, C> {
    /// Create a service with an explicit clock.
    ///
    /// If `store` holds a position younger than the update interval it
    /// becomes the current position; anything else in the store is ignored.
    pub fn with_clock(
        sensor: S,
        geocoder: G,
        config: LocationConfig,
        store: Option<PositionStore>,
        clock: C,
    ) -> Self {
        let now = clock.now();
        let cached = store
            .as_ref()
            .and_then(|s| s.load(now, config.update_interval));

        match &cached {
            Some(position) => info!(
                coordinates = %position.coordinates(),
                observed_at = %position.observed_at(),
                "restored cached position"
            ),
            None => debug!("no fresh cached position"),
        }

        let state = State {
            position: cached,
            ..State::default()
        };

        Self {
            inner: Arc::new(Inner {
                sensor,
                geocoder,
                clock,
                store,
                gate: UpdateGate::from_config(&config),
                config,
                state: Mutex::new(state),
                publishing: Mutex::new(()),
                observers: Observers::default(),
            }),
        }
    }

    /// The latest known position, if any.
    pub fn current_position(&self) -> Option<Position> {
        self.inner.lock().position.clone()
    }

    /// Whether a sensor read or address lookup is in progress.
    pub fn is_acquiring(&self) -> bool {
        self.inner.lock().in_flight > 0
    }

    /// The most recent acquisition error, cleared by the next successful read.
    pub fn last_error(&self) -> Option<LocationError> {
        self.inner.lock().last_error
    }

    /// The clock used to timestamp positions.
    pub fn clock(&self) -> &C {
        &self.inner.clock
    }

    /// Register a callback for accepted updates and passive-read failures.
    ///
    /// The callback runs once per accepted update. Dropping the returned
    /// [`Subscription`] stops delivery.
    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LocationEvent) + Send + Sync + 'static,
    {
        self.inner.observers.register(callback)
    }

    /// Start the passive watch.
    ///
    /// Readings are gated before they replace the current position. The
    /// watch runs until the returned handle is dropped or the sensor reports
    /// `PermissionDenied`. Must be called inside a tokio runtime.
    pub fn start_watch(&self) -> PassiveWatch {
        let inner = Arc::clone(&self.inner);
        let readings = inner
            .sensor
            .watch(WatchOptions::passive(inner.config.update_interval));

        let task = tokio::spawn(async move { inner.run_watch(readings).await });
        PassiveWatch { task: Some(task) }
    }

    /// Take a high-accuracy fix now, bypassing the gate.
    ///
    /// Fails with [`LocationError::Timeout`] if no fix arrives within the
    /// configured refresh timeout. Failures are not retried.
    pub async fn refresh_now(&self) -> Result<Position, LocationError> {
        let inner = &self.inner;
        let _in_flight = inner.begin();

        let options = ReadOptions::high_accuracy(inner.config.refresh_timeout);
        let reading = match tokio::time::timeout(options.timeout, inner.sensor.read_once(options))
            .await
        {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                let error = LocationError::from(e);
                inner.record_error(error);
                return Err(error);
            }
            Err(_) => {
                inner.record_error(LocationError::Timeout);
                return Err(LocationError::Timeout);
            }
        };

        inner.clear_error();
        let ticket = inner.admit();
        let position = Position::new(reading.coordinates, ticket.accepted_at);
        Ok(inner.complete(ticket, position).await)
    }

    /// Replace the current position with an externally supplied one,
    /// bypassing the gate.
    ///
    /// The address is looked up if the position has none; a failed lookup
    /// leaves it absent.
    pub async fn set_position(&self, position: Position) -> Position {
        let inner = &self.inner;
        let _in_flight = inner.begin();
        let ticket = inner.admit();
        inner.complete(ticket, position).await
    }

    /// Look up a typed address and make it the current position.
    pub async fn locate_address(&self, query: &str) -> Result<Position, LocationError> {
        let found = {
            let _in_flight = self.inner.begin();
            self.inner.geocoder.forward(query).await.map_err(|e| {
                warn!(query, error = %e, "address lookup failed");
                LocationError::from(e)
            })?
        };

        let now = self.inner.clock.now();
        let position = Position::new(found.coordinates, now).with_address(found.formatted_address);
        Ok(self.set_position(position).await)
    }

    /// Distance from the current position, if one is known.
    pub fn distance_to(&self, to: &Coordinates) -> Option<f64> {
        self.current_position().map(|p| p.distance_km(to))
    }
}

impl<S: PositionSensor, G: Geocoder, C: Clock> Inner<S, G, C> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> InFlight<'_> {
        self.lock().in_flight += 1;
        InFlight { state: &self.state }
    }

    fn clear_error(&self) {
        self.lock().last_error = None;
    }

    fn record_error(&self, error: LocationError) {
        self.lock().last_error = Some(error);
        warn!(%error, "location acquisition failed");
    }

    /// Record a failure and tell observers about it.
    fn fail(&self, error: LocationError) {
        self.record_error(error);
        self.observers.notify(&LocationEvent::Failed(error));
    }

    /// Accept unconditionally.
    fn admit(&self) -> Ticket {
        let now = self.clock.now();
        let mut state = self.lock();
        state.accepted_seq += 1;
        state.last_accepted_at = Some(now);
        Ticket {
            seq: state.accepted_seq,
            accepted_at: now,
        }
    }

    /// Accept if the gate allows it.
    fn admit_gated(&self, candidate: &Coordinates) -> Option<Ticket> {
        let now = self.clock.now();
        let mut state = self.lock();

        let decision =
            self.gate
                .evaluate(state.position.as_ref(), state.last_accepted_at, candidate, now);
        if !decision.is_accept() {
            debug!(?decision, %candidate, "reading rejected by gate");
            return None;
        }

        state.accepted_seq += 1;
        state.last_accepted_at = Some(now);
        Some(Ticket {
            seq: state.accepted_seq,
            accepted_at: now,
        })
    }

    /// Resolve the address if missing, then publish.
    async fn complete(&self, ticket: Ticket, position: Position) -> Position {
        let position = if position.address().is_some() {
            position
        } else {
            match self.geocoder.reverse(position.coordinates()).await {
                Ok(address) => position.with_address(address),
                Err(e) => {
                    warn!(
                        coordinates = %position.coordinates(),
                        error = %e,
                        "reverse geocoding failed, keeping coordinates only"
                    );
                    position
                }
            }
        };

        self.publish(ticket, &position);
        position
    }

    /// Make `position` current unless a newer acceptance already published.
    ///
    /// The check, the state update, the disk write and the notification all
    /// happen under the publishing lock.
    fn publish(&self, ticket: Ticket, position: &Position) {
        let _publishing = self.publishing.lock().unwrap_or_else(|e| e.into_inner());

        {
            let mut state = self.lock();
            if ticket.seq < state.published_seq {
                debug!(
                    seq = ticket.seq,
                    published = state.published_seq,
                    "discarding superseded update"
                );
                return;
            }
            state.position = Some(position.clone());
            state.published_seq = ticket.seq;
        }

        info!(
            coordinates = %position.coordinates(),
            address = position.address().unwrap_or("-"),
            "position updated"
        );

        if let Some(store) = &self.store
            && let Err(e) = store.save(position)
        {
            warn!(path = %store.path().display(), error = %e, "failed to persist position");
        }

        self.observers.notify(&LocationEvent::Updated(position.clone()));
    }

    /// Gate a passive reading and publish it if accepted.
    async fn offer(&self, reading: SensorReading) {
        let _in_flight = self.begin();
        self.clear_error();

        let Some(ticket) = self.admit_gated(&reading.coordinates) else {
            return;
        };
        let position = Position::new(reading.coordinates, ticket.accepted_at);
        self.complete(ticket, position).await;
    }

    fn has_fresh_position(&self) -> bool {
        let now = self.clock.now();
        self.lock()
            .position
            .as_ref()
            .is_some_and(|p| p.is_fresh(now, self.config.update_interval))
    }

    /// Handle one watch item. Returns `false` once the watch must end.
    async fn handle(&self, item: Result<SensorReading, SensorError>) -> bool {
        match item {
            Ok(reading) => {
                self.offer(reading).await;
                true
            }
            Err(e) => self.fail_watch(LocationError::from(e)),
        }
    }

    fn fail_watch(&self, error: LocationError) -> bool {
        self.fail(error);
        if error.ends_watch() {
            info!(%error, "stopping passive watch");
            return false;
        }
        true
    }

    /// One low-accuracy read for a quick first fix.
    async fn initial_read(&self) -> Result<SensorReading, LocationError> {
        let options =
            ReadOptions::low_accuracy(self.config.refresh_timeout, self.config.update_interval);
        match tokio::time::timeout(options.timeout, self.sensor.read_once(options)).await {
            Ok(result) => result.map_err(LocationError::from),
            Err(_) => Err(LocationError::Timeout),
        }
    }

    async fn run_watch(&self, mut readings: WatchReceiver) {
        debug!("passive watch started");

        // Without a fresh position, race a one-shot read against the first
        // watch item
        if !self.has_fresh_position() {
            let _acquiring = self.begin();
            let keep_going = tokio::select! {
                biased;
                result = self.initial_read() => match result {
                    Ok(reading) => {
                        self.offer(reading).await;
                        true
                    }
                    Err(error) => self.fail_watch(error),
                },
                item = readings.recv() => match item {
                    Some(item) => self.handle(item).await,
                    None => false,
                },
            };
            if !keep_going {
                debug!("passive watch ended");
                return;
            }
        }

        while let Some(item) = readings.recv().await {
            if !self.handle(item).await {
                break;
            }
        }

        debug!("passive watch ended");
    }
}

/// Handle for a running passive watch.
///
/// Dropping it stops the watch and releases the sensor watch.
#[must_use = "dropping a PassiveWatch immediately stops it"]
pub struct PassiveWatch {
    task: Option<JoinHandle<()>>,
}

impl PassiveWatch {
    /// Stop the watch and wait until the sensor watch has been released.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    /// Whether the watch has ended on its own (e.g. permission denied).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }
}

impl Drop for PassiveWatch {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
