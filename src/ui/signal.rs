//! "View added" notification emitted by the GUI thread.
//!
//! Listeners are registered with [`ViewAddedSignal::connect`] and stay
//! connected for as long as the returned [`Connection`] is alive. Dropping
//! the connection disconnects the listener, so a waiter that leaves early
//! (timeout, error, panic) never leaves a callback behind.

use crate::types::{RequestId, ViewHandle};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback invoked on the GUI thread for every created view
pub type ViewAddedListener = Arc<dyn Fn(RequestId, &ViewHandle) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, ViewAddedListener)>,
    closed: bool,
}

/// Multi-listener notification carrying `(request id, view handle)`
#[derive(Default)]
pub struct ViewAddedSignal {
    listeners: Mutex<Listeners>,
}

impl ViewAddedSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a listener. It stays active until the returned connection
    /// is dropped or disconnected. Connecting to a closed signal returns an
    /// inert connection and drops the listener immediately.
    pub fn connect<F>(self: &Arc<Self>, listener: F) -> Connection
    where
        F: Fn(RequestId, &ViewHandle) + Send + Sync + 'static,
    {
        let mut listeners = self.lock();
        if listeners.closed {
            return Connection {
                signal: Weak::new(),
                id: None,
            };
        }

        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Connection {
            signal: Arc::downgrade(self),
            id: Some(id),
        }
    }

    /// Notify all connected listeners. Returns how many were called.
    ///
    /// Listeners run outside the internal lock so they may connect or
    /// disconnect without deadlocking.
    pub fn emit(&self, request: RequestId, handle: &ViewHandle) -> usize {
        let snapshot: Vec<ViewAddedListener> = self
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in &snapshot {
            listener(request, handle);
        }
        snapshot.len()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Drop every listener and refuse new ones. Called when the GUI host
    /// goes away so that nobody waits for a notification that cannot come.
    pub fn close(&self) {
        let dropped = {
            let mut listeners = self.lock();
            listeners.closed = true;
            std::mem::take(&mut listeners.entries)
        };
        if !dropped.is_empty() {
            tracing::debug!("Closed view-added signal with {} listener(s)", dropped.len());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn disconnect(&self, id: u64) -> bool {
        // Removed listeners are dropped after the lock is released.
        let removed: Vec<(u64, ViewAddedListener)> = {
            let mut listeners = self.lock();
            let (removed, kept) = std::mem::take(&mut listeners.entries)
                .into_iter()
                .partition(|(entry_id, _)| *entry_id == id);
            listeners.entries = kept;
            removed
        };
        !removed.is_empty()
    }
}

impl std::fmt::Debug for ViewAddedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.lock();
        f.debug_struct("ViewAddedSignal")
            .field("listeners", &listeners.entries.len())
            .field("closed", &listeners.closed)
            .finish()
    }
}

/// Scoped registration of a listener; disconnects on drop.
#[derive(Debug)]
#[must_use = "dropping a Connection disconnects the listener immediately"]
pub struct Connection {
    signal: Weak<ViewAddedSignal>,
    id: Option<u64>,
}

impl Connection {
    pub fn is_connected(&self) -> bool {
        self.id.is_some() && self.signal.strong_count() > 0
    }

    /// Disconnect now. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(signal) = self.signal.upgrade() {
                signal.disconnect(id);
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
