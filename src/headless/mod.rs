//! Headless mode - line-oriented events for scripts and E2E tests
//!
//! The runner reads commands from stdin and reports everything that happens
//! as one event per line on stdout, either as NDJSON (`--headless`) or as
//! plain text for a human at a terminal.
//!
//! # Example Output
//!
//! ```json
//! {"event":"ready","device_count":2,"timestamp":1704700001000}
//! {"event":"status","status":"connected","timestamp":1704700002000}
//! {"event":"switch","device_id":"00008110-001A","outcome":"loaded","retried":false,"timestamp":1704700002010}
//! {"event":"location","device_id":"00008110-001A","latitude":37.3349,"longitude":-122.009,"timestamp":1704700003000}
//! ```

pub mod command;
pub mod runner;
pub mod surface;

use std::fmt;
use std::io::{self, Write};

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use locswitch_app::{SessionSnapshot, SwitchOutcome};
use locswitch_core::{ConnectionStatus, Coordinate, MovementType};
use locswitch_device::Device;

/// How events are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Short human-readable lines
    #[default]
    Text,
}

/// A device as listed by the `devices` command
#[derive(Debug, Clone, Serialize)]
pub struct DeviceListing {
    pub id: String,
    pub name: String,
    pub os: String,
    pub os_version: String,
    pub selected: bool,
}

/// Events emitted by the runner
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Configuration loaded, commands are accepted from here on
    Ready { device_count: usize, timestamp: i64 },

    /// Global connection status changed
    Status {
        status: ConnectionStatus,
        timestamp: i64,
    },

    /// Error badge on the current device shown or hidden
    ErrorIndicator { visible: bool, timestamp: i64 },

    /// A device's reported location changed (absent coordinates mean "real location")
    Location {
        device_id: String,
        latitude: Option<f64>,
        longitude: Option<f64>,
        timestamp: i64,
    },

    /// A device switch finished
    Switch {
        device_id: String,
        outcome: String,
        retried: bool,
        detail: Option<String>,
        timestamp: i64,
    },

    /// Reply to `devices`
    Devices {
        devices: Vec<DeviceListing>,
        timestamp: i64,
    },

    /// Operator changed the movement type
    MovementType {
        movement_type: MovementType,
        speed_mps: f64,
        timestamp: i64,
    },

    /// Reply to `status`
    Snapshot {
        snapshot: SessionSnapshot,
        timestamp: i64,
    },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Write this event to stdout as one line
    pub fn emit(&self, format: OutputFormat) {
        let line = match format {
            OutputFormat::Json => match serde_json::to_string(self) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize headless event: {}", e);
                    return;
                }
            },
            OutputFormat::Text => self.to_string(),
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn ready(device_count: usize) -> Self {
        Self::Ready {
            device_count,
            timestamp: Self::now(),
        }
    }

    pub fn status(status: ConnectionStatus) -> Self {
        Self::Status {
            status,
            timestamp: Self::now(),
        }
    }

    pub fn error_indicator(visible: bool) -> Self {
        Self::ErrorIndicator {
            visible,
            timestamp: Self::now(),
        }
    }

    pub fn location(device_id: &str, to: Option<Coordinate>) -> Self {
        Self::Location {
            device_id: device_id.to_string(),
            latitude: to.map(|c| c.latitude),
            longitude: to.map(|c| c.longitude),
            timestamp: Self::now(),
        }
    }

    pub fn switch(device_id: &str, outcome: &SwitchOutcome) -> Self {
        let (label, retried, detail) = match outcome {
            SwitchOutcome::Unchanged => ("unchanged", false, None),
            SwitchOutcome::Loaded { restored, retried } => {
                ("loaded", *retried, restored.map(|c| format!("restored {}", c)))
            }
            SwitchOutcome::LoadFailed(err) => ("load_failed", false, Some(err.to_string())),
            SwitchOutcome::RecoveryFailed { os, version } => (
                "recovery_failed",
                false,
                Some(format!("no support files for {} {}", os, version)),
            ),
            SwitchOutcome::Superseded => ("superseded", false, None),
            SwitchOutcome::RetryFailed => ("retry_failed", true, None),
        };
        Self::Switch {
            device_id: device_id.to_string(),
            outcome: label.to_string(),
            retried,
            detail,
            timestamp: Self::now(),
        }
    }

    pub fn devices(devices: &[Device], selected: Option<usize>) -> Self {
        Self::Devices {
            devices: devices
                .iter()
                .enumerate()
                .map(|(i, d)| DeviceListing {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    os: d.os.clone(),
                    os_version: d.os_version.clone(),
                    selected: selected == Some(i),
                })
                .collect(),
            timestamp: Self::now(),
        }
    }

    pub fn movement_type(movement_type: MovementType) -> Self {
        Self::MovementType {
            movement_type,
            speed_mps: movement_type.speed_mps(),
            timestamp: Self::now(),
        }
    }

    pub fn snapshot(snapshot: SessionSnapshot) -> Self {
        Self::Snapshot {
            snapshot,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl fmt::Display for HeadlessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadlessEvent::Ready { device_count, .. } => {
                write!(f, "ready: {} device(s) configured", device_count)
            }
            HeadlessEvent::Status { status, .. } => write!(f, "status: {:?}", status),
            HeadlessEvent::ErrorIndicator { visible, .. } => {
                write!(f, "error indicator: {}", if *visible { "shown" } else { "hidden" })
            }
            HeadlessEvent::Location {
                device_id,
                latitude: Some(lat),
                longitude: Some(lon),
                ..
            } => write!(f, "[{}] location {:.6}, {:.6}", device_id, lat, lon),
            HeadlessEvent::Location { device_id, .. } => {
                write!(f, "[{}] location reset", device_id)
            }
            HeadlessEvent::Switch {
                device_id,
                outcome,
                retried,
                detail,
                ..
            } => {
                write!(f, "[{}] switch {}", device_id, outcome)?;
                if *retried {
                    write!(f, " (after retry)")?;
                }
                if let Some(detail) = detail {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
            HeadlessEvent::Devices { devices, .. } => {
                write!(f, "devices:")?;
                for d in devices {
                    let marker = if d.selected { "*" } else { " " };
                    write!(
                        f,
                        "\n {} {} {} ({} {})",
                        marker, d.id, d.name, d.os, d.os_version
                    )?;
                }
                Ok(())
            }
            HeadlessEvent::MovementType {
                movement_type,
                speed_mps,
                ..
            } => write!(f, "movement type: {} ({:.1} m/s)", movement_type, speed_mps),
            HeadlessEvent::Snapshot { snapshot, .. } => {
                let device = snapshot.device_id.as_deref().unwrap_or("none");
                write!(f, "active device: {} ({:?})", device, snapshot.phase)?;
                if let Some(location) = snapshot.location {
                    write!(f, ", location {}", location)?;
                }
                write!(f, ", {} cached", snapshot.cached_locations)
            }
            HeadlessEvent::Error { message, fatal, .. } => {
                let prefix = if *fatal { "fatal" } else { "error" };
                write!(f, "{}: {}", prefix, message)
            }
        }
    }
}
