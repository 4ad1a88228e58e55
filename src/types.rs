//! Core identifier and value types for BenchView
//!
//! These types are shared by the session registry, the UI request proxy and
//! the scripting layer. None of them own the entity they point at: a
//! [`SignalRef`] is just a path into the session and may go stale at any time.
//!
//! # Main Types
//!
//! - [`DeviceId`] - Opaque identifier of a connected device
//! - [`ChannelRef`] / [`SignalRef`] / [`ConfigurableRef`] - Paths into the session
//! - [`DockArea`] - Placement hint for newly created views
//! - [`ViewHandle`] - Identifier assigned by the GUI thread to a created view
//! - [`RequestId`] - Correlation id carried by every view request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a device in the session
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Reference to a channel of a device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelRef {
    pub device: DeviceId,
    pub channel: String,
}

impl ChannelRef {
    pub fn new(device: impl Into<DeviceId>, channel: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.channel)
    }
}

/// Reference to a measured signal of a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalRef {
    pub device: DeviceId,
    pub channel: String,
    pub signal: String,
}

impl SignalRef {
    pub fn new(
        device: impl Into<DeviceId>,
        channel: impl Into<String>,
        signal: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            channel: channel.into(),
            signal: signal.into(),
        }
    }

    /// The channel this signal belongs to
    pub fn channel_ref(&self) -> ChannelRef {
        ChannelRef {
            device: self.device.clone(),
            channel: self.channel.clone(),
        }
    }
}

impl fmt::Display for SignalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.device, self.channel, self.signal)
    }
}

/// Reference to a configurable (settable) part of a device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigurableRef {
    pub device: DeviceId,
    pub configurable: String,
}

impl ConfigurableRef {
    pub fn new(device: impl Into<DeviceId>, configurable: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            configurable: configurable.into(),
        }
    }
}

impl fmt::Display for ConfigurableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.configurable)
    }
}

/// Where a newly created view should be docked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockArea {
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl DockArea {
    pub const ALL: [DockArea; 4] = [
        DockArea::Left,
        DockArea::Right,
        DockArea::Top,
        DockArea::Bottom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DockArea::Left => "left",
            DockArea::Right => "right",
            DockArea::Top => "top",
            DockArea::Bottom => "bottom",
        }
    }
}

impl fmt::Display for DockArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DockArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(DockArea::Left),
            "right" => Ok(DockArea::Right),
            "top" => Ok(DockArea::Top),
            "bottom" => Ok(DockArea::Bottom),
            other => Err(format!(
                "unknown dock area '{}' (expected left, right, top or bottom)",
                other
            )),
        }
    }
}

/// Identifier of a view created on the GUI thread.
///
/// The empty handle is the sentinel for "no view": it is what a blocking
/// request returns when it timed out or referenced a stale entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ViewHandle(String);

impl ViewHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Correlation id of a single view request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a docked view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Data,
    Control,
    TimePlot,
    XyPlot,
    PowerPanel,
    ValuePanel,
}

impl ViewKind {
    pub fn name(&self) -> &'static str {
        match self {
            ViewKind::Data => "data",
            ViewKind::Control => "control",
            ViewKind::TimePlot => "plot",
            ViewKind::XyPlot => "xy plot",
            ViewKind::PowerPanel => "power panel",
            ViewKind::ValuePanel => "value panel",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
