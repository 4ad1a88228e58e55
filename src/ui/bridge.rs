//! Thread boundary between script threads and the GUI thread.
//!
//! [`channel`] creates the two halves:
//!
//! - [`UiRequestProxy`] - worker side, shared by script threads
//! - [`UiEventQueue`] - GUI side, owned by the [`UiHost`](super::UiHost)
//!
//! Requests travel over an unbounded FIFO queue so posting never blocks,
//! however busy the GUI thread is. Completion notifications travel back
//! through the shared [`ViewAddedSignal`].

use super::proxy::UiRequestProxy;
use super::request::ViewRequest;
use super::signal::ViewAddedSignal;
use crate::config::UiConfig;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::sync::{Arc, OnceLock};
use std::thread::ThreadId;
use std::time::Duration;

/// Identity of the GUI thread, set once when the host is created
pub(crate) type GuiThread = Arc<OnceLock<ThreadId>>;

/// Create a connected proxy/queue pair.
pub fn channel(config: &UiConfig) -> (UiRequestProxy, UiEventQueue) {
    let (tx, rx) = unbounded();
    let view_added = ViewAddedSignal::new();
    let gui_thread: GuiThread = Arc::new(OnceLock::new());

    let proxy = UiRequestProxy::new(
        tx,
        view_added.clone(),
        gui_thread.clone(),
        config.request_timeout(),
    );
    let queue = UiEventQueue {
        rx,
        view_added,
        gui_thread,
    };
    (proxy, queue)
}

/// GUI-side end of the request queue.
///
/// Dropping the queue closes the view-added signal, which wakes any caller
/// still blocked in a request with [`BenchViewError::HostClosed`](crate::BenchViewError::HostClosed).
pub struct UiEventQueue {
    rx: Receiver<ViewRequest>,
    view_added: Arc<ViewAddedSignal>,
    gui_thread: GuiThread,
}

impl UiEventQueue {
    /// Drain all pending requests in arrival order.
    pub fn drain(&self) -> Vec<ViewRequest> {
        let mut requests = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            requests.push(request);
        }
        requests
    }

    /// Try to receive a single request without blocking.
    pub fn try_recv(&self) -> Option<ViewRequest> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next request.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ViewRequest> {
        match self.rx.recv_timeout(timeout) {
            Ok(request) => Some(request),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of requests waiting to be processed
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn view_added(&self) -> &Arc<ViewAddedSignal> {
        &self.view_added
    }

    /// Record the calling thread as the GUI thread.
    ///
    /// Returns `false` if a different thread was already bound.
    pub(crate) fn bind_current_thread(&self) -> bool {
        let current = std::thread::current().id();
        *self.gui_thread.get_or_init(|| current) == current
    }
}

impl Drop for UiEventQueue {
    fn drop(&mut self) {
        self.view_added.close();
    }
}

impl std::fmt::Debug for UiEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiEventQueue")
            .field("pending", &self.rx.len())
            .field("gui_thread", &self.gui_thread.get())
            .finish()
    }
}
