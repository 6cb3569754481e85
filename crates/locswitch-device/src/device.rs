//! Connected device handle

use locswitch_core::ConnectionKind;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A connected device whose location can be overridden
///
/// Equality and hashing only look at `id`: the same physical device seen
/// over USB and over the network is still one device.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Device {
    /// Unique device identifier (UDID / serial)
    pub id: String,

    /// Human-readable device name
    pub name: String,

    /// How the device is attached
    #[serde(default)]
    pub connection: ConnectionKind,

    /// Operating system name, e.g. "iOS"
    pub os: String,

    /// Operating system version, e.g. "17.4"
    pub os_version: String,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        connection: ConnectionKind,
        os: impl Into<String>,
        os_version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            connection,
            os: os.into(),
            os_version: os_version.into(),
        }
    }

    /// Get a display string for the device
    pub fn display_name(&self) -> String {
        match self.connection {
            ConnectionKind::Usb => self.name.clone(),
            ConnectionKind::Network => format!("{} (network)", self.name),
        }
    }

    /// Major.minor part of the OS version, which is what support files are keyed by
    pub fn support_version(&self) -> &str {
        let mut dots = self.os_version.match_indices('.');
        match (dots.next(), dots.next()) {
            (Some(_), Some((second, _))) => &self.os_version[..second],
            _ => &self.os_version,
        }
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_by_id() {
        let usb = Device::new("abc", "iPhone", ConnectionKind::Usb, "iOS", "17.4");
        let wifi = Device::new("abc", "iPhone (Wi-Fi)", ConnectionKind::Network, "iOS", "17.4");
        let other = Device::new("def", "iPhone", ConnectionKind::Usb, "iOS", "17.4");

        assert_eq!(usb, wifi);
        assert_ne!(usb, other);

        let mut set = HashSet::new();
        set.insert(usb);
        assert!(!set.insert(wifi));
    }

    #[test]
    fn test_display_name() {
        let usb = Device::new("a", "iPad", ConnectionKind::Usb, "iOS", "16.0");
        let net = Device::new("b", "iPad", ConnectionKind::Network, "iOS", "16.0");
        assert_eq!(usb.display_name(), "iPad");
        assert_eq!(net.display_name(), "iPad (network)");
    }

    #[test]
    fn test_support_version_truncates_patch() {
        let d = Device::new("a", "iPhone", ConnectionKind::Usb, "iOS", "16.4.1");
        assert_eq!(d.support_version(), "16.4");

        let d = Device::new("a", "iPhone", ConnectionKind::Usb, "iOS", "17.0");
        assert_eq!(d.support_version(), "17.0");

        let d = Device::new("a", "iPhone", ConnectionKind::Usb, "iOS", "15");
        assert_eq!(d.support_version(), "15");
    }

    #[test]
    fn test_deserialize_defaults_connection() {
        let json = r#"{"id":"x","name":"Phone","os":"iOS","os_version":"17.2"}"#;
        let d: Device = serde_json::from_str(json).unwrap();
        assert_eq!(d.connection, ConnectionKind::Usb);
    }
}
