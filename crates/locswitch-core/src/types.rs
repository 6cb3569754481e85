//! Core domain value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Coordinate
// ─────────────────────────────────────────────────────────────────────────────

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Movement
// ─────────────────────────────────────────────────────────────────────────────

/// Speed profile used by the movement engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    #[default]
    Walk,
    Cycle,
    Drive,
}

impl MovementType {
    pub const ALL: [MovementType; 3] = [
        MovementType::Walk,
        MovementType::Cycle,
        MovementType::Drive,
    ];

    /// Simulated speed in metres per second
    pub fn speed_mps(&self) -> f64 {
        match self {
            MovementType::Walk => 1.4,
            MovementType::Cycle => 5.5,
            MovementType::Drive => 16.7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Walk => "walk",
            MovementType::Cycle => "cycle",
            MovementType::Drive => "drive",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" => Ok(MovementType::Walk),
            "cycle" | "bike" => Ok(MovementType::Cycle),
            "drive" | "car" => Ok(MovementType::Drive),
            other => Err(Error::invalid_command(format!(
                "unknown movement type '{}' (expected walk, cycle or drive)",
                other
            ))),
        }
    }
}

/// Whether location changes come from discrete input or a running route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementMode {
    #[default]
    Manual,
    Automatic,
}

impl fmt::Display for MovementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementMode::Manual => write!(f, "manual"),
            MovementMode::Automatic => write!(f, "automatic"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection
// ─────────────────────────────────────────────────────────────────────────────

/// How a device is attached to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    #[default]
    Usb,
    Network,
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionKind::Usb => write!(f, "usb"),
            ConnectionKind::Network => write!(f, "network"),
        }
    }
}

/// Process-wide connection status shown by every presentation surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connected => write!(f, "connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(37.3349, -122.009).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.1).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(1.0, -2.5);
        assert_eq!(c.to_string(), "1.000000, -2.500000");
    }

    #[test]
    fn test_movement_type_default_is_walk() {
        assert_eq!(MovementType::default(), MovementType::Walk);
    }

    #[test]
    fn test_movement_type_speeds_increase() {
        assert!(MovementType::Walk.speed_mps() < MovementType::Cycle.speed_mps());
        assert!(MovementType::Cycle.speed_mps() < MovementType::Drive.speed_mps());
    }

    #[test]
    fn test_movement_type_parse() {
        assert_eq!("Walk".parse::<MovementType>().unwrap(), MovementType::Walk);
        assert_eq!("bike".parse::<MovementType>().unwrap(), MovementType::Cycle);
        assert_eq!(" drive ".parse::<MovementType>().unwrap(), MovementType::Drive);
        assert!("fly".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_type_serde_lowercase() {
        let json = serde_json::to_string(&MovementType::Cycle).unwrap();
        assert_eq!(json, "\"cycle\"");
    }

    #[test]
    fn test_movement_mode_default_is_manual() {
        assert_eq!(MovementMode::default(), MovementMode::Manual);
    }

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }
}
