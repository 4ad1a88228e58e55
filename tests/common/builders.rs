//! Test data builders for creating test objects

use benchview::session::{Channel, Configurable, Device, DeviceKind, Session, Signal};

/// Builder for creating test Sessions
#[derive(Default)]
pub struct SessionBuilder {
    devices: Vec<Device>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Power supply with a V/I pair per channel and one configurable per channel
    pub fn power_supply(mut self, id: &str, channels: &[&str]) -> Self {
        let mut device = Device::new(id, format!("PSU {}", id), DeviceKind::PowerSupply);
        for name in channels {
            device = device
                .with_channel(
                    Channel::new(*name)
                        .with_signal(Signal::new("V", "Voltage", "V"))
                        .with_signal(Signal::new("I", "Current", "A")),
                )
                .with_configurable(Configurable::new(*name).with_setting("enabled"));
        }
        self.devices.push(device);
        self
    }

    /// Multimeter with a single voltage probe `P1`
    pub fn multimeter(mut self, id: &str) -> Self {
        self.devices.push(
            Device::new(id, format!("DMM {}", id), DeviceKind::Multimeter)
                .with_channel(Channel::new("P1").with_signal(Signal::new("V", "Voltage", "V"))),
        );
        self
    }

    pub fn build(self) -> Session {
        let session = Session::new();
        for device in self.devices {
            session.add_device(device);
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchview::types::{DeviceId, SignalRef};

    #[test]
    fn test_session_builder() {
        let session = SessionBuilder::new()
            .power_supply("psu", &["CH1", "CH2"])
            .multimeter("dmm")
            .build();

        assert!(session.contains_device(&DeviceId::new("psu")));
        assert!(session
            .read()
            .resolve_signal(&SignalRef::new("psu", "CH2", "I"))
            .is_some());
        assert_eq!(session.read().len(), 2);
    }
}
