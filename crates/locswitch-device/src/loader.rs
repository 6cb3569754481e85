//! Loading a device into a spoofing session

use std::collections::HashSet;

use locswitch_core::Coordinate;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::DeviceError;
use crate::session::{LocationTransport, SpooferSession};
use crate::support::SupportFileStore;

/// Produces a new [`SpooferSession`] for a device
///
/// Loading may fail with [`DeviceError::MissingSupportFile`], which callers
/// can recover from, or with any other variant, which they cannot.
#[trait_variant::make(DeviceLoader: Send)]
pub trait LocalDeviceLoader {
    async fn load(&self, device: &Device) -> Result<SpooferSession, DeviceError>;
}

/// Loader for development and headless runs
///
/// Checks the support-file store for the device's OS version the way a real
/// loader must before mounting developer services, then hands back a session
/// whose overrides only go to the log.
#[derive(Debug, Clone)]
pub struct SimulatedLoader {
    store: SupportFileStore,
    unpaired: HashSet<String>,
}

impl SimulatedLoader {
    pub fn new(store: SupportFileStore) -> Self {
        Self {
            store,
            unpaired: HashSet::new(),
        }
    }

    /// Treat the device with this id as not paired with the host
    pub fn with_unpaired(mut self, device_id: impl Into<String>) -> Self {
        self.unpaired.insert(device_id.into());
        self
    }
}

impl DeviceLoader for SimulatedLoader {
    async fn load(&self, device: &Device) -> Result<SpooferSession, DeviceError> {
        debug!("Loading {} ({} {})", device.id, device.os, device.os_version);

        if self.unpaired.contains(&device.id) {
            return Err(DeviceError::NotPaired);
        }

        let version = device.support_version();
        if !self.store.has_support_file(&device.os, version) {
            return Err(DeviceError::missing_support_file(&device.os, version));
        }

        info!("Loaded {}", device.display_name());
        let transport = LoggingTransport::new(device.id.clone());
        Ok(SpooferSession::new(device.clone(), Box::new(transport)))
    }
}

/// Transport that only records overrides in the log
#[derive(Debug, Clone)]
pub struct LoggingTransport {
    device_id: String,
}

impl LoggingTransport {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }
}

impl LocationTransport for LoggingTransport {
    fn send_location(&self, coordinate: Coordinate) -> Result<(), DeviceError> {
        info!("[{}] simulate location {}", self.device_id, coordinate);
        Ok(())
    }

    fn clear_location(&self) -> Result<(), DeviceError> {
        info!("[{}] clear simulated location", self.device_id);
        Ok(())
    }
}
