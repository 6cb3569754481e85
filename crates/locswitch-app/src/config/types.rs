//! Configuration types for locswitch
//!
//! Defines:
//! - `Settings` - Global application settings (`config.toml`)
//! - `UserPreferences` - Operator choices remembered between runs
//! - Related sub-types

use std::path::PathBuf;

use locswitch_core::{ConnectionKind, Coordinate, MovementType};
use locswitch_device::Device;
use serde::{Deserialize, Serialize};

/// Application settings (config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub movement: MovementSettings,

    #[serde(default)]
    pub support: SupportSettings,

    #[serde(default)]
    pub host: HostSettings,

    /// Devices offered by the simulated loader
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// Movement settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MovementSettings {
    /// Movement type used until the operator picks one
    #[serde(default)]
    pub default_type: Option<MovementType>,
}

/// Support file locations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SupportSettings {
    /// Local support file store; defaults to `<data dir>/locswitch/support`
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Directory support files are fetched from when missing
    #[serde(default)]
    pub mirror: Option<PathBuf>,
}

/// Host location settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostSettings {
    /// Whether location services are enabled on this machine
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl HostSettings {
    /// Configured fix, if both components are present
    pub fn location(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }
}

/// A device entry in config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceEntry {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub connection: ConnectionKind,

    #[serde(default = "default_os")]
    pub os: String,

    pub os_version: String,

    /// Unpaired devices fail to load
    #[serde(default = "default_true")]
    pub paired: bool,
}

impl DeviceEntry {
    pub fn to_device(&self) -> Device {
        Device::new(
            self.id.clone(),
            self.name.clone(),
            self.connection,
            self.os.clone(),
            self.os_version.clone(),
        )
    }
}

fn default_os() -> String {
    "iOS".to_string()
}

fn default_true() -> bool {
    true
}

/// Operator-specific preferences (stored in preferences.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UserPreferences {
    /// Last movement type chosen by the operator
    #[serde(default)]
    pub last_movement_type: Option<MovementType>,

    /// Last selected device (restored on next start)
    #[serde(default)]
    pub last_device: Option<String>,
}
