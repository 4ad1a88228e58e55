//! Worker-side proxy for UI requests.
//!
//! Scripts run off the GUI thread and must not touch views directly. The
//! proxy turns each UI mutation into a [`ViewRequest`], queues it for the
//! GUI thread and, for requests that produce a view, suspends the caller
//! until the GUI thread reports the new [`ViewHandle`] or the timeout
//! elapses. The GUI thread itself never waits on the proxy.
//!
//! A blocking request goes through these steps:
//!
//! 1. connect a one-shot listener to the view-added signal, filtered on the
//!    request id
//! 2. arm the timer (or a timer that never fires)
//! 3. post the request to the GUI queue
//! 4. block until the listener or the timer fires
//! 5. drop the listener connection and the timer, then return the handle
//!
//! Step 5 runs on every exit path because both live in a [`PendingWait`]
//! that is dropped when the call returns or unwinds.

use super::bridge::GuiThread;
use super::request::{Attachment, UiAction, ViewContent, ViewRequest};
use super::signal::{Connection, ViewAddedSignal};
use crate::error::{BenchViewError, Result};
use crate::types::{DeviceId, DockArea, RequestId, ViewHandle};
use crossbeam_channel::{after, bounded, never, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Synchronous-looking UI API for script threads
pub struct UiRequestProxy {
    events: Sender<ViewRequest>,
    view_added: Arc<ViewAddedSignal>,
    gui_thread: GuiThread,
    next_request: AtomicU64,
    /// Milliseconds; 0 waits forever
    timeout_ms: AtomicU64,
    in_flight: AtomicBool,
}

impl UiRequestProxy {
    pub(crate) fn new(
        events: Sender<ViewRequest>,
        view_added: Arc<ViewAddedSignal>,
        gui_thread: GuiThread,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            events,
            view_added,
            gui_thread,
            next_request: AtomicU64::new(1),
            timeout_ms: AtomicU64::new(timeout_to_millis(timeout)),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Timeout applied by [`request_view`](Self::request_view); `None` waits forever
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.timeout_ms
            .store(timeout_to_millis(timeout), Ordering::Relaxed);
    }

    /// Whether the calling thread is the GUI thread
    pub fn is_gui_thread(&self) -> bool {
        self.gui_thread.get() == Some(&std::thread::current().id())
    }

    /// Create a view on the GUI thread and wait for its handle, using the
    /// proxy's configured timeout.
    ///
    /// Returns an empty handle if the timeout elapsed first or the GUI
    /// thread found a stale reference.
    pub fn request_view(
        &self,
        device_id: &DeviceId,
        area: DockArea,
        content: ViewContent,
    ) -> Result<ViewHandle> {
        self.request_view_with_timeout(device_id, area, content, self.timeout())
    }

    /// Like [`request_view`](Self::request_view) with an explicit timeout.
    ///
    /// A timeout only stops the wait: the view may still be created later,
    /// its handle is then discarded.
    pub fn request_view_with_timeout(
        &self,
        device_id: &DeviceId,
        area: DockArea,
        content: ViewContent,
        timeout: Option<Duration>,
    ) -> Result<ViewHandle> {
        if self.is_gui_thread() {
            return Err(BenchViewError::CalledOnGuiThread);
        }
        let in_flight = InFlightGuard::acquire(&self.in_flight)?;

        let request = ViewRequest::new(
            self.next_id(),
            device_id.clone(),
            UiAction::CreateView { area, content },
        );
        let request_id = request.id();
        let kind = request.kind();

        let pending = PendingWait::begin(&self.view_added, request_id, timeout, in_flight);
        self.post(request)?;
        tracing::debug!("Waiting for {} {} (timeout {:?})", kind, request_id, timeout);

        let started = Instant::now();
        match pending.wait() {
            WaitOutcome::Completed(handle) => {
                tracing::debug!(
                    "{} {} answered with {} after {:?}",
                    kind,
                    request_id,
                    handle,
                    started.elapsed()
                );
                Ok(handle)
            }
            WaitOutcome::TimedOut => {
                tracing::warn!(
                    "{} {} timed out after {:?}; the view may still be created",
                    kind,
                    request_id,
                    started.elapsed()
                );
                Ok(ViewHandle::empty())
            }
            WaitOutcome::HostClosed => Err(BenchViewError::HostClosed),
        }
    }

    /// Add signals to an existing view. Returns as soon as the request is
    /// queued.
    pub fn request_attach(
        &self,
        device_id: &DeviceId,
        view_id: &ViewHandle,
        attachment: Attachment,
    ) -> Result<()> {
        self.post(ViewRequest::new(
            self.next_id(),
            device_id.clone(),
            UiAction::Attach {
                view_id: view_id.clone(),
                attachment,
            },
        ))
    }

    /// Open the tab of a device. Returns as soon as the request is queued.
    pub fn request_device_tab(&self, device_id: &DeviceId) -> Result<()> {
        self.post(ViewRequest::new(
            self.next_id(),
            device_id.clone(),
            UiAction::AddDeviceTab,
        ))
    }

    fn next_id(&self) -> RequestId {
        RequestId(self.next_request.fetch_add(1, Ordering::Relaxed))
    }

    fn post(&self, request: ViewRequest) -> Result<()> {
        let id = request.id();
        let kind = request.kind();
        self.events
            .send(request)
            .map_err(|_| BenchViewError::HostClosed)?;
        tracing::trace!("Posted {} {}", kind, id);
        Ok(())
    }
}

impl std::fmt::Debug for UiRequestProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiRequestProxy")
            .field("timeout", &self.timeout())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("queued", &self.events.len())
            .finish()
    }
}

fn timeout_to_millis(timeout: Option<Duration>) -> u64 {
    match timeout {
        // Sub-millisecond timeouts still have to time out
        Some(d) => u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1),
        None => 0,
    }
}

/// Marks the single blocking request a proxy may have outstanding
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BenchViewError::RequestInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum WaitOutcome {
    Completed(ViewHandle),
    TimedOut,
    HostClosed,
}

/// State of one outstanding blocking request.
///
/// The reply channel holds at most one handle, written by the GUI thread
/// and read once by the waiter. Dropping this struct disconnects the
/// listener; a notification arriving afterwards finds no listener, and one
/// racing with the drop sends into a closed channel and is ignored.
struct PendingWait<'a> {
    reply_rx: Receiver<ViewHandle>,
    timer: Receiver<Instant>,
    _listener: Connection,
    _in_flight: InFlightGuard<'a>,
}

impl<'a> PendingWait<'a> {
    fn begin(
        signal: &Arc<ViewAddedSignal>,
        request: RequestId,
        timeout: Option<Duration>,
        in_flight: InFlightGuard<'a>,
    ) -> Self {
        let (reply_tx, reply_rx) = bounded::<ViewHandle>(1);

        let listener = signal.connect(move |id, handle| {
            if id == request {
                let _ = reply_tx.try_send(handle.clone());
            }
        });

        let timer = match timeout {
            Some(duration) => after(duration),
            None => never(),
        };

        Self {
            reply_rx,
            timer,
            _listener: listener,
            _in_flight: in_flight,
        }
    }

    fn wait(self) -> WaitOutcome {
        select! {
            recv(self.reply_rx) -> reply => match reply {
                Ok(handle) => WaitOutcome::Completed(handle),
                // Listener dropped without answering: the signal was closed
                Err(_) => WaitOutcome::HostClosed,
            },
            recv(self.timer) -> _ => WaitOutcome::TimedOut,
        }
    }
}
