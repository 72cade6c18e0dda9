/*
 * Provides a small observer registry used for the lifecycle notifications of the
 * editing core. Observers register a callback with `connect` and receive every value
 * passed to `emit` until they `disconnect`. Emission may happen on any thread, so
 * callbacks must be `Send + Sync` and should only do cheap work (typically pushing
 * into a channel that is drained elsewhere).
 */
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

// Identifies a single registered observer so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Signal<T> {
    slots: Mutex<Vec<(ConnectionId, Slot<T>)>>,
    next_connection_id: AtomicU64,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Signal {
            slots: Mutex::new(Vec::new()),
            next_connection_id: AtomicU64::new(1),
        }
    }

    pub fn connect<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        log::trace!("Signal: Connected observer {id:?}.");
        id
    }

    /*
     * Removes the observer registered under `id`. Returns false if no such observer
     * exists (already disconnected, or registered on another signal).
     */
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|(slot_id, _)| *slot_id != id);
        let removed = slots.len() != before;
        log::trace!("Signal: Disconnect observer {id:?}, removed: {removed}.");
        removed
    }

    /*
     * Calls every connected observer with `value`, in connection order. The observer
     * list is copied before the calls so a callback may connect or disconnect without
     * deadlocking.
     */
    pub fn emit(&self, value: &T) {
        let slots: Vec<Slot<T>> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, slot)| Arc::clone(slot))
            .collect();
        for slot in slots {
            slot(value);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("observers", &self.observer_count())
            .finish()
    }
}
