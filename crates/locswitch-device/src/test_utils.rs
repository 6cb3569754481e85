//! Test utilities for device types
//!
//! Provides helper functions for creating test devices and recording fakes
//! for the session, loader and recovery seams.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use locswitch_core::{ConnectionKind, Coordinate};

use super::{
    Device, DeviceError, DeviceLoader, LocationObserver, LocationTransport, SpooferSession,
    SupportFileRecovery,
};

/// Creates a test device with basic defaults.
///
/// # Arguments
/// * `id` - Device identifier
/// * `name` - Human-readable device name
///
/// # Returns
/// A USB-connected iOS 17.4 device.
pub fn test_device(id: &str, name: &str) -> Device {
    test_device_full(id, name, ConnectionKind::Usb, "17.4")
}

/// Creates a test device with full control over connection and OS version.
pub fn test_device_full(
    id: &str,
    name: &str,
    connection: ConnectionKind,
    os_version: &str,
) -> Device {
    Device::new(id, name, connection, "iOS", os_version)
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCall {
    Send(Coordinate),
    Clear,
}

/// Transport that records every call; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<TransportCall>>>,
    failure: Arc<Mutex<Option<DeviceError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every following call fail with `err`
    pub fn fail_with(&self, err: DeviceError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    fn record(&self, call: TransportCall) -> Result<(), DeviceError> {
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl LocationTransport for RecordingTransport {
    fn send_location(&self, coordinate: Coordinate) -> Result<(), DeviceError> {
        self.record(TransportCall::Send(coordinate))
    }

    fn clear_location(&self) -> Result<(), DeviceError> {
        self.record(TransportCall::Clear)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Will {
        device: String,
        to: Option<Coordinate>,
    },
    Did {
        device: String,
        to: Option<Coordinate>,
    },
}

/// Observer that records every notification in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl LocationObserver for RecordingObserver {
    fn will_change_location(&self, session: &SpooferSession, to: Option<Coordinate>) {
        self.events.lock().unwrap().push(ObserverEvent::Will {
            device: session.device().id.clone(),
            to,
        });
    }

    fn did_change_location(&self, session: &SpooferSession, to: Option<Coordinate>) {
        self.events.lock().unwrap().push(ObserverEvent::Did {
            device: session.device().id.clone(),
            to,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loader
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ScriptState {
    failures: HashMap<String, VecDeque<DeviceError>>,
    loads: HashMap<String, usize>,
    transports: HashMap<String, RecordingTransport>,
}

/// Loader that succeeds unless a failure has been queued for the device
///
/// Queued failures are consumed one per load, so
/// `fail_next("a", err)` makes exactly the next load of `a` fail.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLoader {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, device_id: &str, err: DeviceError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(device_id.to_string())
            .or_default()
            .push_back(err);
    }

    /// Number of load attempts for a device, successful or not
    pub fn load_count(&self, device_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .loads
            .get(device_id)
            .copied()
            .unwrap_or(0)
    }

    /// Transport handed to the most recent session of a device
    pub fn transport(&self, device_id: &str) -> Option<RecordingTransport> {
        self.state
            .lock()
            .unwrap()
            .transports
            .get(device_id)
            .cloned()
    }
}

impl DeviceLoader for ScriptedLoader {
    async fn load(&self, device: &Device) -> Result<SpooferSession, DeviceError> {
        let mut state = self.state.lock().unwrap();
        *state.loads.entry(device.id.clone()).or_default() += 1;

        if let Some(err) = state
            .failures
            .get_mut(&device.id)
            .and_then(|queue| queue.pop_front())
        {
            return Err(err);
        }

        let transport = RecordingTransport::new();
        state
            .transports
            .insert(device.id.clone(), transport.clone());
        Ok(SpooferSession::new(device.clone(), Box::new(transport)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recovery
// ─────────────────────────────────────────────────────────────────────────────

type DownloadHook = Box<dyn Fn() + Send + Sync>;

/// Recovery returning a fixed answer, with an optional hook run mid-download
#[derive(Clone)]
pub struct ScriptedRecovery {
    succeeds: bool,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    during_download: Arc<Mutex<Option<DownloadHook>>>,
}

impl ScriptedRecovery {
    pub fn succeeding() -> Self {
        Self::new(true)
    }

    pub fn failing() -> Self {
        Self::new(false)
    }

    fn new(succeeds: bool) -> Self {
        Self {
            succeeds,
            calls: Arc::new(Mutex::new(Vec::new())),
            during_download: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `hook` while the download is "in flight", e.g. to change the selection
    pub fn during_download(self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        *self.during_download.lock().unwrap() = Some(Box::new(hook));
        self
    }

    /// `(os, version)` pairs requested so far
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl std::fmt::Debug for ScriptedRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRecovery")
            .field("succeeds", &self.succeeds)
            .field("calls", &self.calls())
            .finish()
    }
}

impl SupportFileRecovery for ScriptedRecovery {
    async fn download_support_file(&self, os: &str, version: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .push((os.to_string(), version.to_string()));
        if let Some(hook) = self.during_download.lock().unwrap().as_ref() {
            hook();
        }
        self.succeeds
    }
}
