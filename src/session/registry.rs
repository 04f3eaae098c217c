use super::model::{DeviceId, DeviceInfo};

/// Devices found during the current discovery, in discovery order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DeviceRegistry {
    devices: Vec<DeviceInfo>,
}

impl DeviceRegistry {
    /// Inserts a device unless one with the same id is already present.
    ///
    /// Returns `true` when the device was new.
    pub(crate) fn insert(&mut self, device: DeviceInfo) -> bool {
        if self.contains(device.id()) {
            return false;
        }
        self.devices.push(device);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.devices.clear();
    }

    /// Returns the device with the given id.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&DeviceInfo> {
        self.devices.iter().find(|device| device.id() == id)
    }

    /// Returns whether a device with the given id was discovered.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the earliest discovered device.
    #[must_use]
    pub fn first(&self) -> Option<&DeviceInfo> {
        self.devices.first()
    }

    #[must_use]
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
