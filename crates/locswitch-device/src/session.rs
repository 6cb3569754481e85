//! Spoofing session bound to a single device
//!
//! A [`SpooferSession`] owns the override state for one device: the current
//! coordinate, the movement settings, an optional running route simulation,
//! and at most one [`LocationObserver`] subscribed to location changes.

use std::fmt;
use std::sync::Arc;

use locswitch_core::{Coordinate, MovementMode, MovementType};
use tracing::{debug, trace};

use crate::device::Device;
use crate::error::DeviceError;

/// Receives before/after notifications for location changes
///
/// Calls always come in pairs: `will_change_location` then
/// `did_change_location`, with the same target. `None` means the display
/// should reset to "no location".
pub trait LocationObserver: Send + Sync {
    fn will_change_location(&self, session: &SpooferSession, to: Option<Coordinate>);
    fn did_change_location(&self, session: &SpooferSession, to: Option<Coordinate>);
}

/// Writes location overrides to a device
pub trait LocationTransport: Send + Sync {
    fn send_location(&self, coordinate: Coordinate) -> Result<(), DeviceError>;
    fn clear_location(&self) -> Result<(), DeviceError>;
}

/// Handle used to stop a running route simulation
pub struct SimulationHandle {
    stop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SimulationHandle {
    pub fn new(stop: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Stop a simulation running as a tokio task
    pub fn from_abort_handle(handle: tokio::task::AbortHandle) -> Self {
        Self::new(move || handle.abort())
    }

    /// Stop the simulation. Calling it twice is harmless.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for SimulationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationHandle")
            .field("running", &self.stop.is_some())
            .finish()
    }
}

/// Live spoofing state for one device
pub struct SpooferSession {
    device: Device,
    current_location: Option<Coordinate>,
    movement_type: MovementType,
    movement_mode: MovementMode,
    subscriber: Option<Arc<dyn LocationObserver>>,
    simulation: Option<SimulationHandle>,
    transport: Box<dyn LocationTransport>,
}

impl SpooferSession {
    pub fn new(device: Device, transport: Box<dyn LocationTransport>) -> Self {
        Self {
            device,
            current_location: None,
            movement_type: MovementType::default(),
            movement_mode: MovementMode::default(),
            subscriber: None,
            simulation: None,
            transport,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn current_location(&self) -> Option<Coordinate> {
        self.current_location
    }

    /// Plain assignment; nobody is notified
    pub fn set_current_location(&mut self, location: Option<Coordinate>) {
        self.current_location = location;
    }

    pub fn movement_type(&self) -> MovementType {
        self.movement_type
    }

    pub fn set_movement_type(&mut self, movement_type: MovementType) {
        self.movement_type = movement_type;
    }

    pub fn movement_mode(&self) -> MovementMode {
        self.movement_mode
    }

    /// Switching to `Manual` stops a running simulation before returning
    pub fn set_movement_mode(&mut self, mode: MovementMode) {
        if mode == MovementMode::Manual {
            if let Some(mut simulation) = self.simulation.take() {
                debug!("Stopping route simulation on {}", self.device.id);
                simulation.stop();
            }
        }
        self.movement_mode = mode;
    }

    /// Hand a running simulation to the session; any previous one is stopped
    pub fn start_simulation(&mut self, handle: SimulationHandle) {
        if let Some(mut previous) = self.simulation.replace(handle) {
            previous.stop();
        }
        self.movement_mode = MovementMode::Automatic;
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation.is_some()
    }

    pub fn subscribe(&mut self, observer: Arc<dyn LocationObserver>) {
        self.subscriber = Some(observer);
    }

    pub fn unsubscribe(&mut self) {
        self.subscriber = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_some()
    }

    /// Install a location override and notify the subscriber
    pub fn set_location(&mut self, coordinate: Coordinate) -> Result<(), DeviceError> {
        if !coordinate.is_valid() {
            return Err(DeviceError::transport(format!(
                "coordinate out of range: {}",
                coordinate
            )));
        }

        let subscriber = self.subscriber.clone();
        if let Some(observer) = &subscriber {
            observer.will_change_location(self, Some(coordinate));
        }

        self.transport.send_location(coordinate)?;
        self.current_location = Some(coordinate);
        trace!("{} now reports {}", self.device.id, coordinate);

        if let Some(observer) = &subscriber {
            observer.did_change_location(self, Some(coordinate));
        }
        Ok(())
    }

    /// Clear the override so the device reports its native location again
    pub fn reset_location(&mut self) -> Result<(), DeviceError> {
        let subscriber = self.subscriber.clone();
        if let Some(observer) = &subscriber {
            observer.will_change_location(self, None);
        }

        self.transport.clear_location()?;
        self.current_location = None;
        trace!("{} location override cleared", self.device.id);

        if let Some(observer) = &subscriber {
            observer.did_change_location(self, None);
        }
        Ok(())
    }
}

impl fmt::Debug for SpooferSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpooferSession")
            .field("device", &self.device.id)
            .field("current_location", &self.current_location)
            .field("movement_type", &self.movement_type)
            .field("movement_mode", &self.movement_mode)
            .field("subscribed", &self.subscriber.is_some())
            .field("simulating", &self.simulation.is_some())
            .finish()
    }
}
