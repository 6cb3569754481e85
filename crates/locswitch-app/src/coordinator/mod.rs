//! Device switch coordination
//!
//! [`DeviceSwitchCoordinator`] owns the one bound [`SpooferSession`] and the
//! [`LocationCache`]. Switching devices goes through a fixed sequence:
//!
//! ```text
//! Idle → TearingDown → Loading ─┬─→ Succeeded
//!                               ├─→ Failed                 (unrecoverable)
//!                               └─→ Recovering ─┬─→ Failed (download failed / selection moved on)
//!                                               └─→ Retrying ─→ Succeeded | Failed
//! ```
//!
//! Only a missing support file is recovered from, and only with one retry.
//! Every mutating operation takes `&mut self`; callers that share the
//! coordinator go through [`crate::Engine`], which runs one operation at a time.

use std::sync::Arc;

use serde::Serialize;

use locswitch_core::prelude::*;
use locswitch_core::{ConnectionStatus, Coordinate, MovementMode, MovementType};
use locswitch_device::{
    Device, DeviceError, DeviceLoader, LocationObserver, SpooferSession, SupportFileRecovery,
};

use crate::cache::LocationCache;
use crate::host::{self, HostLocationProvider};
use crate::ui::{ErrorIndicator, MovementTypeSource, SelectionSource, StatusSink};


/// Where the current (or most recent) switch is in its sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPhase {
    #[default]
    Idle,
    TearingDown,
    Loading,
    Recovering,
    Retrying,
    Succeeded,
    Failed,
}

/// How a `select_device` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchOutcome {
    /// The chosen device was already active; nothing changed
    Unchanged,

    /// The device is loaded and bound
    Loaded {
        /// Coordinate restored from the cache, if any
        restored: Option<Coordinate>,
        /// Whether it took a recovery and retry to get there
        retried: bool,
    },

    /// Unrecoverable load failure
    LoadFailed(DeviceError),

    /// The support file could not be acquired
    RecoveryFailed { os: String, version: String },

    /// Recovery succeeded but the operator picked another device meanwhile
    Superseded,

    /// The single retry after recovery failed as well
    RetryFailed,
}

impl SwitchOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SwitchOutcome::Loaded { .. })
    }
}

/// Everything outside the coordinator that it reports to or reads from
#[derive(Clone)]
pub struct Collaborators {
    pub status: Arc<dyn StatusSink>,
    pub error_indicator: Arc<dyn ErrorIndicator>,
    /// Reconciliation hooks; also subscribed to the bound session
    pub hooks: Arc<dyn LocationObserver>,
    pub selection: Arc<dyn SelectionSource>,
    pub movement: Arc<dyn MovementTypeSource>,
}

/// The device switch state machine
pub struct DeviceSwitchCoordinator<L, R> {
    loader: L,
    recovery: R,
    ui: Collaborators,
    cache: LocationCache,
    session: Option<SpooferSession>,
    phase: SwitchPhase,
}

impl<L, R> DeviceSwitchCoordinator<L, R>
where
    L: DeviceLoader,
    R: SupportFileRecovery,
{
    pub fn new(loader: L, recovery: R, ui: Collaborators) -> Self {
        Self {
            loader,
            recovery,
            ui,
            cache: LocationCache::new(),
            session: None,
            phase: SwitchPhase::Idle,
        }
    }

    /// Start from an existing cache (e.g. carried over from another coordinator)
    pub fn with_cache(mut self, cache: LocationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn session(&self) -> Option<&SpooferSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut SpooferSession> {
        self.session.as_mut()
    }

    pub fn active_device(&self) -> Option<&Device> {
        self.session.as_ref().map(SpooferSession::device)
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub fn phase(&self) -> SwitchPhase {
        self.phase
    }

    fn enter(&mut self, phase: SwitchPhase) {
        trace!("Switch phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    // ─────────────────────────────────────────────────────────
    // Device switching
    // ─────────────────────────────────────────────────────────

    /// Make `chosen` the active device
    ///
    /// Load failures never escape this call; they end up in the returned
    /// outcome and on the error indicator.
    pub async fn select_device(&mut self, chosen: &Device) -> SwitchOutcome {
        // Reflect the operator's intent before anything can fail
        self.ui.status.set_status(ConnectionStatus::Connected);

        if self.active_device() == Some(chosen) {
            debug!("{} is already the active device", chosen.id);
            return SwitchOutcome::Unchanged;
        }

        if let Some(outgoing) = self.session.take() {
            self.enter(SwitchPhase::TearingDown);
            self.tear_down(outgoing);
        }

        info!("Switching to {}", chosen.display_name());
        self.enter(SwitchPhase::Loading);
        let err = match self.attempt_load(chosen).await {
            Ok(restored) => {
                self.enter(SwitchPhase::Succeeded);
                return SwitchOutcome::Loaded {
                    restored,
                    retried: false,
                };
            }
            Err(err) => err,
        };

        self.ui.error_indicator.show();

        let (os, version) = match err {
            DeviceError::MissingSupportFile { os, version } => (os, version),
            other => {
                warn!("Failed to load {}: {}", chosen.id, other);
                self.enter(SwitchPhase::Failed);
                return SwitchOutcome::LoadFailed(other);
            }
        };

        info!(
            "{} needs support files for {} {}, fetching",
            chosen.id, os, version
        );
        self.enter(SwitchPhase::Recovering);
        if !self.recovery.download_support_file(&os, &version).await {
            warn!("Could not acquire support files for {} {}", os, version);
            self.enter(SwitchPhase::Failed);
            return SwitchOutcome::RecoveryFailed { os, version };
        }

        // The operator may have moved on while the download ran
        let still_selected = self
            .ui
            .selection
            .selected_device()
            .is_some_and(|selected| &selected == chosen);
        if !still_selected {
            info!("Selection changed during recovery, not retrying {}", chosen.id);
            self.enter(SwitchPhase::Failed);
            return SwitchOutcome::Superseded;
        }

        self.enter(SwitchPhase::Retrying);
        match self.attempt_load(chosen).await {
            Ok(restored) => {
                self.ui.error_indicator.hide();
                self.enter(SwitchPhase::Succeeded);
                SwitchOutcome::Loaded {
                    restored,
                    retried: true,
                }
            }
            // One shot only; the indicator already tells the operator
            Err(_) => {
                self.enter(SwitchPhase::Failed);
                SwitchOutcome::RetryFailed
            }
        }
    }

    /// Stop and detach the outgoing session, remembering where it was
    fn tear_down(&mut self, mut outgoing: SpooferSession) {
        debug!("Tearing down session for {}", outgoing.device().id);
        outgoing.set_movement_mode(MovementMode::Manual);
        outgoing.unsubscribe();

        if let Some(location) = outgoing.current_location() {
            self.cache.put(outgoing.device().clone(), location);
        }

        self.ui.hooks.will_change_location(&outgoing, None);
        self.ui.hooks.did_change_location(&outgoing, None);
    }

    /// Load `chosen` and bind it, restoring its cached location
    async fn attempt_load(&mut self, chosen: &Device) -> std::result::Result<Option<Coordinate>, DeviceError> {
        let mut session = self.loader.load(chosen).await?;

        session.set_movement_type(self.ui.movement.last_movement_type().unwrap_or_default());
        self.ui.error_indicator.hide();
        self.ui.status.set_status(ConnectionStatus::Connected);
        session.subscribe(self.ui.hooks.clone());

        let restored = self.cache.get(chosen);
        if let Some(location) = restored {
            debug!("Restoring {} to {}", chosen.id, location);
            session.set_current_location(Some(location));
            self.ui.hooks.will_change_location(&session, Some(location));
            self.ui.hooks.did_change_location(&session, Some(location));
            session.set_movement_mode(MovementMode::Manual);
        }

        self.session = Some(session);
        Ok(restored)
    }

    /// Forget the bound session if `device` was it
    ///
    /// Returns whether the active device was affected. Its last location
    /// stays cached for when it comes back.
    pub fn device_disconnected(&mut self, device: &Device) -> bool {
        if self.active_device() != Some(device) {
            return false;
        }

        info!("Active device {} disconnected", device.id);
        if let Some(outgoing) = self.session.take() {
            self.tear_down(outgoing);
        }
        self.ui.status.set_status(ConnectionStatus::Disconnected);
        self.enter(SwitchPhase::Idle);
        true
    }

    // ─────────────────────────────────────────────────────────
    // Location control
    // ─────────────────────────────────────────────────────────

    /// Override the active device's location
    ///
    /// `Ok(false)` when no session is bound.
    pub fn set_location(&mut self, coordinate: Coordinate) -> std::result::Result<bool, DeviceError> {
        let Some(session) = self.session.as_mut() else {
            trace!("set_location ignored, no active device");
            return Ok(false);
        };
        session.set_location(coordinate)?;
        Ok(true)
    }

    /// Let the active device report its real location again
    pub fn reset_location(&mut self) -> std::result::Result<bool, DeviceError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        session.reset_location()?;
        Ok(true)
    }

    /// Apply the operator's movement type to the active session
    pub fn set_movement_type(&mut self, movement_type: MovementType) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.set_movement_type(movement_type);
                true
            }
            None => false,
        }
    }

    /// Move the active device to where the host machine is
    pub async fn move_to_host_location<H>(&mut self, host: &H) -> Result<bool>
    where
        H: HostLocationProvider + Sync,
    {
        let location = host::resolve_host_location(host).await?;
        Ok(self.set_location(location)?)
    }
}
