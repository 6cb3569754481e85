//! Ordered list of connected devices and the operator's current choice
//!
//! The registry is the selection surface: the device popup writes into it,
//! and the switch coordinator reads it back after a slow recovery to check
//! the operator still wants the device it was loading.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::device::Device;

#[derive(Debug, Default)]
struct RegistryInner {
    devices: Vec<Device>,
    selected_index: Option<usize>,
}

/// Thread-safe registry of connected devices
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    inner: RwLock<RegistryInner>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let registry = Self::new();
        for device in devices {
            registry.add(device);
        }
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a device, replacing an existing entry with the same id in place
    pub fn add(&self, device: Device) {
        let mut inner = self.write();
        if let Some(existing) = inner.devices.iter_mut().find(|d| **d == device) {
            *existing = device;
        } else {
            debug!("Device connected: {}", device.id);
            inner.devices.push(device);
        }
    }

    /// Remove a device, keeping the selection on the same device when possible
    pub fn remove(&self, device_id: &str) -> Option<Device> {
        let mut inner = self.write();
        let pos = inner.devices.iter().position(|d| d.id == device_id)?;
        let removed = inner.devices.remove(pos);
        debug!("Device disconnected: {}", removed.id);

        inner.selected_index = match inner.selected_index {
            Some(sel) if sel == pos => None,
            Some(sel) if sel > pos => Some(sel - 1),
            other => other,
        };

        Some(removed)
    }

    pub fn devices(&self) -> Vec<Device> {
        self.read().devices.clone()
    }

    pub fn find(&self, device_id: &str) -> Option<Device> {
        self.read().devices.iter().find(|d| d.id == device_id).cloned()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.read().selected_index
    }

    pub fn selected_device(&self) -> Option<Device> {
        let inner = self.read();
        inner
            .selected_index
            .and_then(|idx| inner.devices.get(idx))
            .cloned()
    }

    /// Select device by index (0-based)
    pub fn select_by_index(&self, index: usize) -> Option<Device> {
        let mut inner = self.write();
        let device = inner.devices.get(index).cloned()?;
        inner.selected_index = Some(index);
        Some(device)
    }

    /// Select device by id
    pub fn select_by_id(&self, device_id: &str) -> Option<Device> {
        let mut inner = self.write();
        let pos = inner.devices.iter().position(|d| d.id == device_id)?;
        inner.selected_index = Some(pos);
        inner.devices.get(pos).cloned()
    }

    pub fn clear_selection(&self) {
        self.write().selected_index = None;
    }

    pub fn len(&self) -> usize {
        self.read().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().devices.is_empty()
    }
}
