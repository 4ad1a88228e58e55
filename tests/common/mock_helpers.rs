//! Mock construction helpers

use benchview::config::UiConfig;
use benchview::error::Result;
use benchview::session::Session;
use benchview::types::{DeviceId, DockArea, ViewHandle};
use benchview::ui::{self, Attachment, DockLayout, UiHost, UiRequestProxy, ViewContent, ViewFactory};
use std::sync::Arc;
use std::time::Duration;

/// One call made by the host into a [`RecordingFactory`]
#[derive(Debug, Clone, PartialEq)]
pub enum FactoryCall {
    CreateView(DeviceId, DockArea),
    Attach(ViewHandle),
    DeviceTab(DeviceId),
}

/// Dock layout that records every call and can simulate a slow GUI
#[derive(Debug, Default)]
pub struct RecordingFactory {
    pub layout: DockLayout,
    pub calls: Vec<FactoryCall>,
    /// Time spent inside `create_view` before answering
    pub create_delay: Duration,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create_delay(delay: Duration) -> Self {
        Self {
            create_delay: delay,
            ..Default::default()
        }
    }

    pub fn device_tab_calls(&self) -> Vec<DeviceId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                FactoryCall::DeviceTab(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ViewFactory for RecordingFactory {
    fn create_view(
        &mut self,
        device_id: &DeviceId,
        area: DockArea,
        content: &ViewContent,
    ) -> Result<ViewHandle> {
        self.calls
            .push(FactoryCall::CreateView(device_id.clone(), area));
        if !self.create_delay.is_zero() {
            std::thread::sleep(self.create_delay);
        }
        self.layout.create_view(device_id, area, content)
    }

    fn attach(&mut self, view_id: &ViewHandle, attachment: &Attachment) -> Result<()> {
        self.calls.push(FactoryCall::Attach(view_id.clone()));
        self.layout.attach(view_id, attachment)
    }

    fn open_device_tab(&mut self, device_id: &DeviceId) -> Result<()> {
        self.calls.push(FactoryCall::DeviceTab(device_id.clone()));
        self.layout.open_device_tab(device_id)
    }
}

/// Proxy plus a host bound to the calling thread, which becomes the GUI thread
pub fn create_test_host<F: ViewFactory>(
    session: Session,
    factory: F,
    config: &UiConfig,
) -> (Arc<UiRequestProxy>, UiHost<F>) {
    let (proxy, queue) = ui::channel(config);
    let host = UiHost::new(queue, session, factory);
    (Arc::new(proxy), host)
}
