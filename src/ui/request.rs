//! Requests sent from a script thread to the GUI thread.

use crate::types::{
    ChannelRef, ConfigurableRef, DeviceId, DockArea, RequestId, SignalRef, ViewHandle, ViewKind,
};
use std::fmt;

/// What a newly created view should display
#[derive(Debug, Clone, PartialEq)]
pub enum ViewContent {
    /// Table of the values of one signal
    Data { signal: SignalRef },
    /// Controls for a configurable
    Control { configurable: ConfigurableRef },
    /// Time plot following the active signal of a channel
    ChannelPlot { channel: ChannelRef },
    /// Time plot of a single signal
    SignalPlot { signal: SignalRef },
    /// X/Y plot of two signals
    XyPlot { x: SignalRef, y: SignalRef },
    /// Voltage/current/power panel
    PowerPanel { voltage: SignalRef, current: SignalRef },
    /// Large value display following the active signal of a channel
    ChannelValuePanel { channel: ChannelRef },
    /// Large value display of a single signal
    SignalValuePanel { signal: SignalRef },
}

impl ViewContent {
    /// The kind of view this content produces
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewContent::Data { .. } => ViewKind::Data,
            ViewContent::Control { .. } => ViewKind::Control,
            ViewContent::ChannelPlot { .. } | ViewContent::SignalPlot { .. } => ViewKind::TimePlot,
            ViewContent::XyPlot { .. } => ViewKind::XyPlot,
            ViewContent::PowerPanel { .. } => ViewKind::PowerPanel,
            ViewContent::ChannelValuePanel { .. } | ViewContent::SignalValuePanel { .. } => {
                ViewKind::ValuePanel
            }
        }
    }

    /// Signals displayed by this content
    pub fn signals(&self) -> Vec<SignalRef> {
        match self {
            ViewContent::Data { signal }
            | ViewContent::SignalPlot { signal }
            | ViewContent::SignalValuePanel { signal } => vec![signal.clone()],
            ViewContent::XyPlot { x, y } => vec![x.clone(), y.clone()],
            ViewContent::PowerPanel { voltage, current } => vec![voltage.clone(), current.clone()],
            ViewContent::Control { .. }
            | ViewContent::ChannelPlot { .. }
            | ViewContent::ChannelValuePanel { .. } => Vec::new(),
        }
    }

    /// Channels referenced directly (not through a signal)
    pub fn channels(&self) -> Vec<ChannelRef> {
        match self {
            ViewContent::ChannelPlot { channel } | ViewContent::ChannelValuePanel { channel } => {
                vec![channel.clone()]
            }
            _ => Vec::new(),
        }
    }

    pub fn configurable(&self) -> Option<&ConfigurableRef> {
        match self {
            ViewContent::Control { configurable } => Some(configurable),
            _ => None,
        }
    }
}

/// Signals to add to an existing view
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    /// Add a signal column to a data view
    DataSignal(SignalRef),
    /// Add a curve to a time plot
    PlotSignal(SignalRef),
    /// Add an x/y curve to an xy plot
    XyCurve { x: SignalRef, y: SignalRef },
}

impl Attachment {
    pub fn signals(&self) -> Vec<SignalRef> {
        match self {
            Attachment::DataSignal(signal) | Attachment::PlotSignal(signal) => vec![signal.clone()],
            Attachment::XyCurve { x, y } => vec![x.clone(), y.clone()],
        }
    }

    /// View kind the target view must have
    pub fn target_kind(&self) -> ViewKind {
        match self {
            Attachment::DataSignal(_) => ViewKind::Data,
            Attachment::PlotSignal(_) => ViewKind::TimePlot,
            Attachment::XyCurve { .. } => ViewKind::XyPlot,
        }
    }
}

/// The UI mutation to perform
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Create and dock a new view; answered with a `ViewHandle`
    CreateView { area: DockArea, content: ViewContent },
    /// Add signals to an existing view; fire-and-forget
    Attach {
        view_id: ViewHandle,
        attachment: Attachment,
    },
    /// Open the tab of a device; fire-and-forget
    AddDeviceTab,
}

/// Tag of a request, used for logging and dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRequestKind {
    AddDataView,
    AddControlView,
    AddPlotView,
    AddPowerPanelView,
    AddValuePanelView,
    AttachSignalToView,
    AddDeviceTab,
}

impl fmt::Display for ViewRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewRequestKind::AddDataView => "add_data_view",
            ViewRequestKind::AddControlView => "add_control_view",
            ViewRequestKind::AddPlotView => "add_plot_view",
            ViewRequestKind::AddPowerPanelView => "add_power_panel_view",
            ViewRequestKind::AddValuePanelView => "add_value_panel_view",
            ViewRequestKind::AttachSignalToView => "attach_signal_to_view",
            ViewRequestKind::AddDeviceTab => "add_device_tab",
        };
        f.write_str(name)
    }
}

/// A single UI request travelling from a worker thread to the GUI thread.
///
/// Immutable once built; the proxy hands it over to the event queue and the
/// GUI host consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    id: RequestId,
    device_id: DeviceId,
    action: UiAction,
}

impl ViewRequest {
    pub fn new(id: RequestId, device_id: DeviceId, action: UiAction) -> Self {
        Self {
            id,
            device_id,
            action,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn action(&self) -> &UiAction {
        &self.action
    }

    pub fn into_action(self) -> UiAction {
        self.action
    }

    pub fn kind(&self) -> ViewRequestKind {
        match &self.action {
            UiAction::CreateView { content, .. } => match content.kind() {
                ViewKind::Data => ViewRequestKind::AddDataView,
                ViewKind::Control => ViewRequestKind::AddControlView,
                ViewKind::TimePlot | ViewKind::XyPlot => ViewRequestKind::AddPlotView,
                ViewKind::PowerPanel => ViewRequestKind::AddPowerPanelView,
                ViewKind::ValuePanel => ViewRequestKind::AddValuePanelView,
            },
            UiAction::Attach { .. } => ViewRequestKind::AttachSignalToView,
            UiAction::AddDeviceTab => ViewRequestKind::AddDeviceTab,
        }
    }

    /// Whether the requester waits for a `ViewHandle`
    pub fn expects_handle(&self) -> bool {
        matches!(self.action, UiAction::CreateView { .. })
    }
}
