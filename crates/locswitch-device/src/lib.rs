//! # locswitch-device - Device-Side Collaborators
//!
//! Everything the switch coordinator talks to on the device side: the device
//! handle, the spoofing session bound to one device, loading a session, and
//! recovering a missing platform support file.
//!
//! Depends on [`locswitch_core`] for value types and error handling.
//!
//! ## Public API
//!
//! ### Devices
//! - [`Device`] - Connected device (identity, connection kind, OS version)
//! - [`DeviceRegistry`] - Ordered list of connected devices and the chosen one
//!
//! ### Sessions
//! - [`SpooferSession`] - Spoofing state bound to exactly one device
//! - [`LocationObserver`] - Before/after location change notifications
//! - [`LocationTransport`] - Where location overrides are written
//! - [`SimulationHandle`] - Stops a running route simulation
//!
//! ### Loading & Recovery
//! - [`DeviceLoader`] - Produce a session for a device, may fail with [`DeviceError`]
//! - [`SupportFileRecovery`] - Acquire a missing support file
//! - [`SupportFileStore`], [`MirrorRecovery`] - File-system backed support files
//! - [`SimulatedLoader`] - Loader that checks the support-file store

pub mod device;
pub mod error;
pub mod loader;
pub mod registry;
pub mod session;
pub mod support;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use device::Device;
pub use error::DeviceError;
pub use loader::{DeviceLoader, LocalDeviceLoader, LoggingTransport, SimulatedLoader};
pub use registry::DeviceRegistry;
pub use session::{LocationObserver, LocationTransport, SimulationHandle, SpooferSession};
pub use support::{
    LocalSupportFileRecovery, MirrorRecovery, SupportFileRecovery, SupportFileStore,
    SUPPORT_FILE_NAMES,
};
