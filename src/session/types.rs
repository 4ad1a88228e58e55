//! Session data types

use std::collections::BTreeMap;

use crate::types::DeviceId;

/// Class of a connected instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    PowerSupply,
    ElectronicLoad,
    Multimeter,
    #[default]
    Other,
}

impl DeviceKind {
    /// Display name for the kind
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceKind::PowerSupply => "Power Supply",
            DeviceKind::ElectronicLoad => "Electronic Load",
            DeviceKind::Multimeter => "Multimeter",
            DeviceKind::Other => "Device",
        }
    }
}

/// A time signal produced by a channel (e.g. voltage of CH1)
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    /// Measured quantity, e.g. "Voltage"
    pub quantity: String,
    /// Unit symbol, e.g. "V"
    pub unit: String,
}

impl Signal {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
        }
    }
}

/// A measurement channel of a device
#[derive(Debug, Clone, Default)]
pub struct Channel {
    pub name: String,
    pub signals: BTreeMap<String, Signal>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signals: BTreeMap::new(),
        }
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.insert(signal.name.clone(), signal);
        self
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }
}

/// A settable part of a device (output stage, measurement function, ...)
#[derive(Debug, Clone, Default)]
pub struct Configurable {
    pub name: String,
    /// Names of the settings this configurable exposes
    pub settings: Vec<String>,
}

impl Configurable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: Vec::new(),
        }
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.settings.push(setting.into());
        self
    }
}

/// A device connected to the session
#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub channels: BTreeMap<String, Channel>,
    pub configurables: BTreeMap<String, Configurable>,
}

impl Device {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            channels: BTreeMap::new(),
            configurables: BTreeMap::new(),
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.insert(channel.name.clone(), channel);
        self
    }

    pub fn with_configurable(mut self, configurable: Configurable) -> Self {
        self.configurables
            .insert(configurable.name.clone(), configurable);
        self
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn configurable(&self, name: &str) -> Option<&Configurable> {
        self.configurables.get(name)
    }

    /// Title used for device tabs
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.kind.display_name())
    }
}
