//! Device session registry
//!
//! The session holds the devices currently connected to the application,
//! together with their channels, signals and configurables. Scripts and the
//! GUI host address these entities through the reference types in
//! [`crate::types`] and resolve them here on use.
//!
//! Devices may be removed at any time (e.g. unplugged), so every resolution
//! can fail. The GUI host re-resolves references when it processes a
//! request and treats a missing entity as a stale reference.

pub mod types;

pub use types::{Channel, Configurable, Device, DeviceKind, Signal};

use crate::error::{BenchViewError, Result};
use crate::types::{ChannelRef, ConfigurableRef, DeviceId, SignalRef};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Devices currently known to the session
#[derive(Debug, Default)]
pub struct SessionRegistry {
    devices: BTreeMap<DeviceId, Device>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing any device with the same id
    pub fn add_device(&mut self, device: Device) -> Option<Device> {
        tracing::info!("Device '{}' added to session", device.id);
        self.devices.insert(device.id.clone(), device)
    }

    /// Remove a device, returning it if it was present
    pub fn remove_device(&mut self, id: &DeviceId) -> Option<Device> {
        let removed = self.devices.remove(id);
        if removed.is_some() {
            tracing::info!("Device '{}' removed from session", id);
        }
        removed
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn resolve_channel(&self, channel: &ChannelRef) -> Option<&Channel> {
        self.device(&channel.device)?.channel(&channel.channel)
    }

    pub fn resolve_signal(&self, signal: &SignalRef) -> Option<&Signal> {
        self.device(&signal.device)?
            .channel(&signal.channel)?
            .signal(&signal.signal)
    }

    pub fn resolve_configurable(&self, configurable: &ConfigurableRef) -> Option<&Configurable> {
        self.device(&configurable.device)?
            .configurable(&configurable.configurable)
    }

    /// Look up a device, failing with a descriptive error
    pub fn require_device(&self, id: &DeviceId) -> Result<&Device> {
        self.device(id)
            .ok_or_else(|| BenchViewError::Session(format!("Unknown device '{}'", id)))
    }

    /// Build a channel reference, failing if the channel does not exist
    pub fn channel_ref(&self, device: &DeviceId, channel: &str) -> Result<ChannelRef> {
        let dev = self.require_device(device)?;
        if dev.channel(channel).is_none() {
            return Err(BenchViewError::Session(format!(
                "Device '{}' has no channel '{}'",
                device, channel
            )));
        }
        Ok(ChannelRef::new(device.clone(), channel))
    }

    /// Build a signal reference, failing if the signal does not exist
    pub fn signal_ref(&self, device: &DeviceId, channel: &str, signal: &str) -> Result<SignalRef> {
        let reference = SignalRef::new(device.clone(), channel, signal);
        self.channel_ref(device, channel)?;
        if self.resolve_signal(&reference).is_none() {
            return Err(BenchViewError::Session(format!(
                "Channel '{}' of device '{}' has no signal '{}'",
                channel, device, signal
            )));
        }
        Ok(reference)
    }

    /// Build a configurable reference, failing if it does not exist
    pub fn configurable_ref(&self, device: &DeviceId, configurable: &str) -> Result<ConfigurableRef> {
        let dev = self.require_device(device)?;
        if dev.configurable(configurable).is_none() {
            return Err(BenchViewError::Session(format!(
                "Device '{}' has no configurable '{}'",
                device, configurable
            )));
        }
        Ok(ConfigurableRef::new(device.clone(), configurable))
    }
}

/// Thread-safe handle to the session registry
///
/// Cloning is cheap; all clones see the same devices.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionRegistry>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: SessionRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Acquire read access. A poisoned lock is recovered since the registry
    /// has no invariants spanning multiple fields.
    pub fn read(&self) -> RwLockReadGuard<'_, SessionRegistry> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SessionRegistry> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_device(&self, device: Device) {
        self.write().add_device(device);
    }

    pub fn remove_device(&self, id: &DeviceId) -> Option<Device> {
        self.write().remove_device(id)
    }

    pub fn contains_device(&self, id: &DeviceId) -> bool {
        self.read().device(id).is_some()
    }

    /// A session with a few simulated bench instruments
    pub fn demo() -> Self {
        let mut registry = SessionRegistry::new();

        registry.add_device(
            Device::new("psu", "Demo Power Supply", DeviceKind::PowerSupply)
                .with_channel(
                    Channel::new("CH1")
                        .with_signal(Signal::new("V", "Voltage", "V"))
                        .with_signal(Signal::new("I", "Current", "A"))
                        .with_signal(Signal::new("P", "Power", "W")),
                )
                .with_channel(
                    Channel::new("CH2")
                        .with_signal(Signal::new("V", "Voltage", "V"))
                        .with_signal(Signal::new("I", "Current", "A")),
                )
                .with_configurable(
                    Configurable::new("CH1")
                        .with_setting("enabled")
                        .with_setting("voltage_target")
                        .with_setting("current_limit"),
                ),
        );

        registry.add_device(
            Device::new("load", "Demo Electronic Load", DeviceKind::ElectronicLoad)
                .with_channel(
                    Channel::new("CH1")
                        .with_signal(Signal::new("V", "Voltage", "V"))
                        .with_signal(Signal::new("I", "Current", "A")),
                )
                .with_configurable(
                    Configurable::new("CH1")
                        .with_setting("enabled")
                        .with_setting("regulation")
                        .with_setting("current_target"),
                ),
        );

        registry.add_device(
            Device::new("dmm", "Demo Multimeter", DeviceKind::Multimeter)
                .with_channel(Channel::new("P1").with_signal(Signal::new("V", "Voltage", "V")))
                .with_configurable(
                    Configurable::new("P1")
                        .with_setting("measured_quantity")
                        .with_setting("range"),
                ),
        );

        Self::from_registry(registry)
    }
}
