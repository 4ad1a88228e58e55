//! GUI-thread side of the request bridge.
//!
//! The host is created on the GUI thread and services the request queue
//! from that thread's loop, one request at a time, always to completion.
//! It never blocks on a worker: after creating a view it emits the
//! view-added notification and moves on.

use super::bridge::UiEventQueue;
use super::request::{Attachment, UiAction, ViewContent, ViewRequest};
use super::views::ViewFactory;
use crate::session::{Session, SessionRegistry};
use crate::types::{DeviceId, DockArea, RequestId, ViewHandle};
use std::time::Duration;

/// Counters for processed requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub processed: u64,
    pub views_created: u64,
    pub attached: u64,
    /// Requests dropped or answered empty because an entity was gone
    pub stale: u64,
    /// Requests the view factory refused
    pub failed: u64,
}

/// Services [`ViewRequest`]s on the GUI thread
pub struct UiHost<F: ViewFactory> {
    queue: UiEventQueue,
    session: Session,
    factory: F,
    stats: HostStats,
}

impl<F: ViewFactory> UiHost<F> {
    /// Create the host. Must be called on the GUI thread: the calling
    /// thread is recorded so that blocking requests from it are rejected.
    pub fn new(queue: UiEventQueue, session: Session, factory: F) -> Self {
        if !queue.bind_current_thread() {
            tracing::warn!("UI host created on a different thread than the one first bound");
        }
        Self {
            queue,
            session,
            factory,
            stats: HostStats::default(),
        }
    }

    /// Process every queued request without waiting. Call once per frame.
    pub fn process_pending(&mut self) -> usize {
        let requests = self.queue.drain();
        let count = requests.len();
        for request in requests {
            self.handle_request(request);
        }
        count
    }

    /// Wait up to `timeout` for a request, then process everything queued.
    pub fn process_for(&mut self, timeout: Duration) -> usize {
        match self.queue.recv_timeout(timeout) {
            Some(first) => {
                self.handle_request(first);
                1 + self.process_pending()
            }
            None => 0,
        }
    }

    /// Process a single request
    pub fn handle_request(&mut self, request: ViewRequest) {
        self.stats.processed += 1;
        let id = request.id();
        let kind = request.kind();
        tracing::debug!("Handling {} {} for device '{}'", kind, id, request.device_id());

        let device_id = request.device_id().clone();
        match request.into_action() {
            UiAction::CreateView { area, content } => {
                let handle = self.create_view(id, &device_id, area, &content);
                self.queue.view_added().emit(id, &handle);
            }
            UiAction::Attach {
                view_id,
                attachment,
            } => self.attach(id, &device_id, &view_id, &attachment),
            UiAction::AddDeviceTab => self.open_device_tab(id, &device_id),
        }
    }

    fn create_view(
        &mut self,
        id: RequestId,
        device_id: &DeviceId,
        area: DockArea,
        content: &ViewContent,
    ) -> ViewHandle {
        if let Err(reason) = check_content(&self.session.read(), device_id, content) {
            tracing::warn!("Request {} refers to a stale entity: {}", id, reason);
            self.stats.stale += 1;
            return ViewHandle::empty();
        }

        match self.factory.create_view(device_id, area, content) {
            Ok(handle) => {
                tracing::info!("Created {} view {} in {} area", content.kind(), handle, area);
                self.stats.views_created += 1;
                handle
            }
            Err(e) => {
                tracing::warn!("Request {} failed: {}", id, e);
                self.stats.failed += 1;
                ViewHandle::empty()
            }
        }
    }

    fn attach(
        &mut self,
        id: RequestId,
        device_id: &DeviceId,
        view_id: &ViewHandle,
        attachment: &Attachment,
    ) {
        let stale = {
            let registry = self.session.read();
            check_device(&registry, device_id).and_then(|_| {
                attachment
                    .signals()
                    .iter()
                    .try_for_each(|s| match registry.resolve_signal(s) {
                        Some(_) => Ok(()),
                        None => Err(format!("signal '{}' no longer exists", s)),
                    })
            })
        };
        if let Err(reason) = stale {
            tracing::warn!("Dropping attach request {}: {}", id, reason);
            self.stats.stale += 1;
            return;
        }

        match self.factory.attach(view_id, attachment) {
            Ok(()) => {
                tracing::debug!("Attached {:?} to {}", attachment.signals(), view_id);
                self.stats.attached += 1;
            }
            Err(e) => {
                tracing::warn!("Attach request {} failed: {}", id, e);
                self.stats.failed += 1;
            }
        }
    }

    fn open_device_tab(&mut self, id: RequestId, device_id: &DeviceId) {
        if let Err(reason) = check_device(&self.session.read(), device_id) {
            tracing::warn!("Dropping device tab request {}: {}", id, reason);
            self.stats.stale += 1;
            return;
        }
        if let Err(e) = self.factory.open_device_tab(device_id) {
            tracing::warn!("Device tab request {} failed: {}", id, e);
            self.stats.failed += 1;
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Tear down the host, returning the factory. Waiting callers are woken
    /// with `HostClosed`.
    pub fn into_factory(self) -> F {
        self.factory
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    /// Requests queued but not processed yet
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

fn check_device(registry: &SessionRegistry, device_id: &DeviceId) -> Result<(), String> {
    match registry.device(device_id) {
        Some(_) => Ok(()),
        None => Err(format!("device '{}' is no longer connected", device_id)),
    }
}

fn check_content(
    registry: &SessionRegistry,
    device_id: &DeviceId,
    content: &ViewContent,
) -> Result<(), String> {
    check_device(registry, device_id)?;

    for signal in content.signals() {
        if registry.resolve_signal(&signal).is_none() {
            return Err(format!("signal '{}' no longer exists", signal));
        }
    }
    for channel in content.channels() {
        if registry.resolve_channel(&channel).is_none() {
            return Err(format!("channel '{}' no longer exists", channel));
        }
    }
    if let Some(configurable) = content.configurable() {
        if registry.resolve_configurable(configurable).is_none() {
            return Err(format!("configurable '{}' no longer exists", configurable));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::error::BenchViewError;
    use crate::types::{ChannelRef, SignalRef};
    use crate::ui::bridge::channel;
    use crate::ui::views::{DockLayout, MockViewFactory};
    use mockall::predicate::eq;
    use std::sync::{Arc, Mutex};

    fn record_notifications(queue_signal: &Arc<crate::ui::ViewAddedSignal>) -> (
        crate::ui::Connection,
        Arc<Mutex<Vec<(RequestId, ViewHandle)>>>,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let conn = queue_signal.connect(move |id, handle| {
            s.lock().unwrap().push((id, handle.clone()));
        });
        (conn, seen)
    }

    #[test]
    fn test_create_view_calls_factory_and_notifies() {
        let (_proxy, queue) = channel(&UiConfig::default());
        let (_conn, seen) = record_notifications(queue.view_added());

        let mut factory = MockViewFactory::new();
        factory
            .expect_create_view()
            .withf(|device, area, content| {
                device.as_str() == "psu"
                    && *area == DockArea::Left
                    && matches!(content, ViewContent::ChannelPlot { .. })
            })
            .times(1)
            .returning(|_, _, _| Ok(ViewHandle::new("view-1")));

        let mut host = UiHost::new(queue, Session::demo(), factory);
        host.handle_request(ViewRequest::new(
            RequestId(3),
            DeviceId::new("psu"),
            UiAction::CreateView {
                area: DockArea::Left,
                content: ViewContent::ChannelPlot {
                    channel: ChannelRef::new("psu", "CH1"),
                },
            },
        ));

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(RequestId(3), ViewHandle::new("view-1"))]
        );
        assert_eq!(host.stats().views_created, 1);
    }

    #[test]
    fn test_stale_reference_answers_empty_without_factory_call() {
        let (_proxy, queue) = channel(&UiConfig::default());
        let (_conn, seen) = record_notifications(queue.view_added());

        let mut factory = MockViewFactory::new();
        factory.expect_create_view().times(0);

        let session = Session::demo();
        let mut host = UiHost::new(queue, session.clone(), factory);
        session.remove_device(&DeviceId::new("dmm"));

        host.handle_request(ViewRequest::new(
            RequestId(1),
            DeviceId::new("dmm"),
            UiAction::CreateView {
                area: DockArea::Right,
                content: ViewContent::SignalValuePanel {
                    signal: SignalRef::new("dmm", "P1", "V"),
                },
            },
        ));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1.is_empty());
        assert_eq!(host.stats().stale, 1);
    }

    #[test]
    fn test_factory_error_answers_empty() {
        let (_proxy, queue) = channel(&UiConfig::default());
        let (_conn, seen) = record_notifications(queue.view_added());

        let mut factory = MockViewFactory::new();
        factory
            .expect_create_view()
            .returning(|_, _, _| Err(BenchViewError::View("no room".to_string())));

        let mut host = UiHost::new(queue, Session::demo(), factory);
        host.handle_request(ViewRequest::new(
            RequestId(1),
            DeviceId::new("psu"),
            UiAction::CreateView {
                area: DockArea::Right,
                content: ViewContent::Data {
                    signal: SignalRef::new("psu", "CH1", "V"),
                },
            },
        ));

        assert!(seen.lock().unwrap()[0].1.is_empty());
        assert_eq!(host.stats().failed, 1);
    }

    #[test]
    fn test_attach_is_not_notified() {
        let (_proxy, queue) = channel(&UiConfig::default());
        let (_conn, seen) = record_notifications(queue.view_added());

        let mut factory = MockViewFactory::new();
        factory
            .expect_attach()
            .with(
                eq(ViewHandle::new("view-1")),
                eq(Attachment::PlotSignal(SignalRef::new("psu", "CH1", "P"))),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let mut host = UiHost::new(queue, Session::demo(), factory);
        host.handle_request(ViewRequest::new(
            RequestId(2),
            DeviceId::new("psu"),
            UiAction::Attach {
                view_id: ViewHandle::new("view-1"),
                attachment: Attachment::PlotSignal(SignalRef::new("psu", "CH1", "P")),
            },
        ));

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(host.stats().attached, 1);
    }

    #[test]
    fn test_attach_with_stale_signal_is_dropped() {
        let (_proxy, queue) = channel(&UiConfig::default());
        let mut factory = MockViewFactory::new();
        factory.expect_attach().times(0);

        let mut host = UiHost::new(queue, Session::demo(), factory);
        host.handle_request(ViewRequest::new(
            RequestId(2),
            DeviceId::new("psu"),
            UiAction::Attach {
                view_id: ViewHandle::new("view-1"),
                attachment: Attachment::DataSignal(SignalRef::new("psu", "CH7", "V")),
            },
        ));
        assert_eq!(host.stats().stale, 1);
    }

    #[test]
    fn test_process_pending_with_dock_layout() {
        let (proxy, queue) = channel(&UiConfig::default());
        let mut host = UiHost::new(queue, Session::demo(), DockLayout::new());

        proxy.request_device_tab(&DeviceId::new("load")).unwrap();
        proxy.request_device_tab(&DeviceId::new("psu")).unwrap();
        proxy.request_device_tab(&DeviceId::new("scope")).unwrap();
        assert_eq!(host.pending(), 3);

        assert_eq!(host.process_pending(), 3);
        assert_eq!(
            host.factory().device_tabs(),
            &[DeviceId::new("load"), DeviceId::new("psu")]
        );
        assert_eq!(host.stats().stale, 1);
        assert_eq!(host.process_for(Duration::from_millis(1)), 0);
    }
}
