//! View construction on the GUI thread.
//!
//! [`ViewFactory`] is the seam between the request host and whatever builds
//! the actual widgets. [`DockLayout`] is the in-memory implementation used
//! by the headless host and the tests: it records docked views per area and
//! assigns handles of the form `view-N`.

use super::request::{Attachment, ViewContent};
use crate::error::{BenchViewError, Result};
use crate::types::{DeviceId, DockArea, SignalRef, ViewHandle, ViewKind};

/// Builds and mutates views. Only ever called on the GUI thread.
#[cfg_attr(test, mockall::automock)]
pub trait ViewFactory {
    /// Create and dock a view, returning its handle
    fn create_view(
        &mut self,
        device_id: &DeviceId,
        area: DockArea,
        content: &ViewContent,
    ) -> Result<ViewHandle>;

    /// Add signals to an existing view
    fn attach(&mut self, view_id: &ViewHandle, attachment: &Attachment) -> Result<()>;

    /// Open (or focus) the tab of a device
    fn open_device_tab(&mut self, device_id: &DeviceId) -> Result<()>;
}

/// A view docked in the layout
#[derive(Debug, Clone, PartialEq)]
pub struct DockedView {
    pub handle: ViewHandle,
    pub device_id: DeviceId,
    pub area: DockArea,
    pub kind: ViewKind,
    pub title: String,
    pub content: ViewContent,
    /// Signals added after creation
    pub attached: Vec<SignalRef>,
}

impl DockedView {
    /// All signals shown by the view
    pub fn signals(&self) -> Vec<SignalRef> {
        let mut signals = self.content.signals();
        signals.extend(self.attached.iter().cloned());
        signals
    }
}

/// In-memory dock layout
#[derive(Debug, Default)]
pub struct DockLayout {
    views: Vec<DockedView>,
    device_tabs: Vec<DeviceId>,
    next_view: u64,
}

impl DockLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> &[DockedView] {
        &self.views
    }

    pub fn view(&self, handle: &ViewHandle) -> Option<&DockedView> {
        self.views.iter().find(|v| &v.handle == handle)
    }

    pub fn views_in(&self, area: DockArea) -> impl Iterator<Item = &DockedView> {
        self.views.iter().filter(move |v| v.area == area)
    }

    /// Device tabs in the order they were opened
    pub fn device_tabs(&self) -> &[DeviceId] {
        &self.device_tabs
    }

    pub fn close_view(&mut self, handle: &ViewHandle) -> Option<DockedView> {
        let index = self.views.iter().position(|v| &v.handle == handle)?;
        Some(self.views.remove(index))
    }

    fn title_for(device_id: &DeviceId, content: &ViewContent) -> String {
        let subject = match content {
            ViewContent::Data { signal }
            | ViewContent::SignalPlot { signal }
            | ViewContent::SignalValuePanel { signal } => signal.signal.clone(),
            ViewContent::Control { configurable } => configurable.configurable.clone(),
            ViewContent::ChannelPlot { channel } | ViewContent::ChannelValuePanel { channel } => {
                channel.channel.clone()
            }
            ViewContent::XyPlot { x, y } => format!("{} / {}", y.signal, x.signal),
            ViewContent::PowerPanel { voltage, .. } => voltage.channel.clone(),
        };
        let kind = content.kind().name();
        let mut chars = kind.chars();
        let kind: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        format!("{} {} [{}]", kind, subject, device_id)
    }
}

impl ViewFactory for DockLayout {
    fn create_view(
        &mut self,
        device_id: &DeviceId,
        area: DockArea,
        content: &ViewContent,
    ) -> Result<ViewHandle> {
        self.next_view += 1;
        let handle = ViewHandle::new(format!("view-{}", self.next_view));

        self.views.push(DockedView {
            handle: handle.clone(),
            device_id: device_id.clone(),
            area,
            kind: content.kind(),
            title: Self::title_for(device_id, content),
            content: content.clone(),
            attached: Vec::new(),
        });
        Ok(handle)
    }

    fn attach(&mut self, view_id: &ViewHandle, attachment: &Attachment) -> Result<()> {
        let view = self
            .views
            .iter_mut()
            .find(|v| &v.handle == view_id)
            .ok_or_else(|| BenchViewError::View(format!("Unknown view '{}'", view_id)))?;

        let expected = attachment.target_kind();
        if view.kind != expected {
            return Err(BenchViewError::View(format!(
                "View '{}' is a {} view, expected a {} view",
                view_id, view.kind, expected
            )));
        }

        view.attached.extend(attachment.signals());
        Ok(())
    }

    fn open_device_tab(&mut self, device_id: &DeviceId) -> Result<()> {
        if !self.device_tabs.contains(device_id) {
            self.device_tabs.push(device_id.clone());
        }
        Ok(())
    }
}
