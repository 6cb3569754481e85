//! locswitch-app - Device switch coordination for locswitch
//!
//! This crate holds the switch state machine, the per-device location cache,
//! the interfaces presentation surfaces implement, configuration loading, and
//! the Engine that serialises coordinator operations onto a single task.

pub mod cache;
pub mod config;
pub mod controls;
pub mod coordinator;
pub mod engine;
pub mod host;
pub mod ui;

// Re-export primary types
pub use cache::LocationCache;
pub use controls::MovementControls;
pub use coordinator::{Collaborators, DeviceSwitchCoordinator, SwitchOutcome, SwitchPhase};
pub use engine::{Engine, EngineHandle, PendingSwitch, SessionSnapshot};
pub use host::{HostLocationProvider, LocalHostLocationProvider, StaticHostLocation};
pub use ui::{ErrorIndicator, MovementTypeSource, SelectionSource, StatusSink};

// Re-export device types used at the app boundary
pub use locswitch_device::{Device, DeviceError, DeviceRegistry, LocationObserver, SpooferSession};
