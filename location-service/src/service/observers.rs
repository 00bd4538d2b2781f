//! Callback registry for location events.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::domain::Position;

use super::error::LocationError;

/// Something observers are told about.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A new position was accepted and published.
    Updated(Position),
    /// A passive read failed.
    Failed(LocationError),
}

type Callback = Arc<dyn Fn(&LocationEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// Registered observers.
///
/// Callbacks run synchronously under the registry lock, in registration
/// order. A callback must not register or drop a subscription itself.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    registry: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

impl Observers {
    pub(crate) fn register<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&LocationEvent) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.callbacks.push((id, Arc::new(callback)));

        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    pub(crate) fn notify(&self, event: &LocationEvent) {
        let registry = lock(&self.registry);
        for (_, callback) in &registry.callbacks {
            callback(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }
}

/// Handle for a registered callback.
///
/// Dropping it unregisters the callback. Once the drop returns, the
/// callback will not be invoked again.
#[must_use = "dropping a Subscription immediately unregisters the callback"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: u64,
}

impl Subscription {
    /// Unregister the callback.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
