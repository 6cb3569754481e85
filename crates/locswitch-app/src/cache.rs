//! Per-device last-known location
//!
//! Written when a device's session is torn down, read when the device becomes
//! active again. Entries live for the whole process: a device that disconnects
//! and comes back returns to where it was.

use std::collections::HashMap;

use locswitch_core::Coordinate;
use locswitch_device::Device;

/// In-memory map of device to its last observed coordinate
#[derive(Debug, Default, Clone)]
pub struct LocationCache {
    entries: HashMap<Device, Coordinate>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last cached coordinate for `device`
    pub fn get(&self, device: &Device) -> Option<Coordinate> {
        self.entries.get(device).copied()
    }

    /// Insert or overwrite the coordinate for `device`
    pub fn put(&mut self, device: Device, coordinate: Coordinate) {
        self.entries.insert(device, coordinate);
    }

    pub fn contains(&self, device: &Device) -> bool {
        self.entries.contains_key(device)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
