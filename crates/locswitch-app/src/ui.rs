//! Interfaces implemented by presentation surfaces
//!
//! The coordinator never renders anything itself. It reports through these
//! traits, and reads back the two pieces of operator state it needs: which
//! device is chosen and which movement type was last picked.

use locswitch_core::{ConnectionStatus, MovementType};
use locswitch_device::{Device, DeviceRegistry};

/// Process-wide connection status, observed by every surface
#[cfg_attr(test, mockall::automock)]
pub trait StatusSink: Send + Sync {
    fn set_status(&self, status: ConnectionStatus);
}

/// Error badge on the surface showing the current device
#[cfg_attr(test, mockall::automock)]
pub trait ErrorIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// The authoritative device selection
#[cfg_attr(test, mockall::automock)]
pub trait SelectionSource: Send + Sync {
    fn devices(&self) -> Vec<Device>;
    fn selected_index(&self) -> Option<usize>;

    fn selected_device(&self) -> Option<Device> {
        let index = self.selected_index()?;
        self.devices().into_iter().nth(index)
    }
}

/// The operator's last movement type choice
#[cfg_attr(test, mockall::automock)]
pub trait MovementTypeSource: Send + Sync {
    fn last_movement_type(&self) -> Option<MovementType>;
}

impl SelectionSource for DeviceRegistry {
    fn devices(&self) -> Vec<Device> {
        DeviceRegistry::devices(self)
    }

    fn selected_index(&self) -> Option<usize> {
        DeviceRegistry::selected_index(self)
    }

    fn selected_device(&self) -> Option<Device> {
        DeviceRegistry::selected_device(self)
    }
}
