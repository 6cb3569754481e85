//! Headless mode runner - stdin command loop over the engine
//!
//! Wires configuration into a coordinator (simulated loader, mirror recovery,
//! configured host location), spawns the engine, and executes one command per
//! stdin line.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use locswitch_app::config::{self, DeviceEntry, Settings};
use locswitch_app::{
    Collaborators, DeviceRegistry, DeviceSwitchCoordinator, Engine, EngineHandle,
    MovementControls, PendingSwitch, StaticHostLocation,
};
use locswitch_core::prelude::*;
use locswitch_device::{MirrorRecovery, SimulatedLoader, SupportFileRecovery, SupportFileStore};

use super::command::HeadlessCommand;
use super::surface::EventSurface;
use super::{HeadlessEvent, OutputFormat};

/// Run the command loop until `quit` or end of input
pub async fn run(config_dir: &Path, format: OutputFormat) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("locswitch runner starting ({:?} output)", format);
    info!("Config: {}", config_dir.display());
    info!("═══════════════════════════════════════════════════════");

    if let Err(e) = config::init_config_dir(config_dir) {
        warn!("Failed to initialize config directory: {}", e);
    }
    let settings = config::load_settings(config_dir);
    let runner = Runner::new(config_dir, &settings, format);

    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        read_stdin_blocking(line_tx);
    });

    if let Err(e) = runner.restore_last_device().await {
        warn!("Could not restore last device: {}", e);
        runner.report(&e);
    }
    runner.emit(HeadlessEvent::ready(runner.registry().len()));

    let mut result = Ok(());
    while let Some(line) = line_rx.recv().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<HeadlessCommand>() {
            Ok(HeadlessCommand::Quit) => {
                info!("Quit requested");
                break;
            }
            Ok(command) => command,
            Err(e) => {
                runner.report(&e);
                continue;
            }
        };

        if let Err(e) = runner.execute(command).await {
            runner.report(&e);
            if e.is_fatal() {
                error!("Fatal error, stopping: {}", e);
                result = Err(e);
                break;
            }
        }
    }

    runner.shutdown().await;
    info!("locswitch runner exiting");
    result
}

/// Everything one run needs: the engine plus the operator-facing state around it
///
/// A `select` updates the registry and queues the switch, then returns without
/// waiting for it. The outcome is reported from a tracked task, so the next
/// line is read while a slow recovery is still running and a newer selection
/// is visible to the coordinator when it checks before retrying.
pub struct Runner {
    config_dir: PathBuf,
    registry: Arc<DeviceRegistry>,
    controls: Arc<MovementControls>,
    surface: Arc<EventSurface>,
    engine: EngineHandle,
    task: JoinHandle<()>,
    switches: Mutex<JoinSet<()>>,
}

impl Runner {
    /// Build the collaborators from settings and spawn the engine
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config_dir: &Path, settings: &Settings, format: OutputFormat) -> Self {
        let mirror_dir = settings
            .support
            .mirror
            .clone()
            .unwrap_or_else(config::default_mirror_dir);
        debug!("Support file mirror {}", mirror_dir.display());

        let recovery = MirrorRecovery::new(mirror_dir, support_store(settings));
        Self::with_recovery(config_dir, settings, format, recovery)
    }

    /// Like [`Runner::new`] but with a caller-supplied support file recovery
    pub fn with_recovery<R>(
        config_dir: &Path,
        settings: &Settings,
        format: OutputFormat,
        recovery: R,
    ) -> Self
    where
        R: SupportFileRecovery + Send + Sync + 'static,
    {
        let store = support_store(settings);
        debug!("Support files in {}", store.root().display());
        let loader = settings
            .devices
            .iter()
            .filter(|entry| !entry.paired)
            .fold(SimulatedLoader::new(store), |loader, entry| {
                loader.with_unpaired(entry.id.clone())
            });

        let registry = Arc::new(DeviceRegistry::with_devices(
            settings.devices.iter().map(DeviceEntry::to_device),
        ));
        let controls = Arc::new(MovementControls::persisted(
            config_dir,
            settings.movement.default_type,
        ));
        let surface = Arc::new(EventSurface::new(format));
        let host = StaticHostLocation::new(settings.host.enabled, settings.host.location());

        let collaborators = Collaborators {
            status: surface.clone(),
            error_indicator: surface.clone(),
            hooks: surface.clone(),
            selection: registry.clone(),
            movement: controls.clone(),
        };
        let coordinator = DeviceSwitchCoordinator::new(loader, recovery, collaborators);
        let (engine, task) = Engine::spawn(coordinator, host);

        Self {
            config_dir: config_dir.to_path_buf(),
            registry,
            controls,
            surface,
            engine,
            task,
            switches: Mutex::new(JoinSet::new()),
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn emit(&self, event: HeadlessEvent) {
        self.surface.emit(event);
    }

    /// Emit an error event for a failed command
    pub fn report(&self, err: &Error) {
        self.emit(HeadlessEvent::error(err.to_string(), err.is_fatal()));
    }

    /// Re-select the device chosen in the previous run, if it is still configured
    pub async fn restore_last_device(&self) -> Result<()> {
        let Some(id) = config::load_user_preferences(&self.config_dir).and_then(|p| p.last_device)
        else {
            return Ok(());
        };
        if self.registry.find(&id).is_none() {
            debug!("Last device {} is no longer configured", id);
            return Ok(());
        }

        info!("Restoring last device {}", id);
        self.execute(HeadlessCommand::Select(id)).await
    }

    pub async fn execute(&self, command: HeadlessCommand) -> Result<()> {
        match command {
            HeadlessCommand::Devices => {
                self.emit(HeadlessEvent::devices(
                    &self.registry.devices(),
                    self.registry.selected_index(),
                ));
            }
            HeadlessCommand::Select(id) => {
                let pending = self.select(&id).await?;
                self.follow_switch(id, pending);
            }
            HeadlessCommand::Disconnect(id) => {
                let device = self
                    .registry
                    .remove(&id)
                    .ok_or_else(|| Error::unknown_device(&id))?;
                self.engine.device_disconnected(device).await?;
            }
            HeadlessCommand::Set(coordinate) => {
                if !self.engine.set_location(coordinate).await? {
                    debug!("No active device, ignoring set {}", coordinate);
                }
            }
            HeadlessCommand::Reset => {
                self.engine.reset_location().await?;
            }
            HeadlessCommand::Move(movement_type) => {
                self.controls.select(movement_type)?;
                self.engine.set_movement_type(movement_type).await?;
                self.emit(HeadlessEvent::movement_type(movement_type));
            }
            HeadlessCommand::Host => {
                self.engine.move_to_host_location().await?;
            }
            HeadlessCommand::Status => {
                let snapshot = self.engine.snapshot().await?;
                self.emit(HeadlessEvent::snapshot(snapshot));
            }
            HeadlessCommand::Quit => {}
        }
        Ok(())
    }

    /// Make `device_id` the operator's choice and queue the switch to it
    pub async fn select(&self, device_id: &str) -> Result<PendingSwitch> {
        let device = self
            .registry
            .select_by_id(device_id)
            .ok_or_else(|| Error::unknown_device(device_id))?;
        self.engine.queue_select(device).await
    }

    /// Report the outcome of a queued switch once it has run
    fn follow_switch(&self, id: String, pending: PendingSwitch) {
        let surface = self.surface.clone();
        let config_dir = self.config_dir.clone();

        let mut switches = self.switches.lock().unwrap_or_else(|e| e.into_inner());
        while switches.try_join_next().is_some() {}
        switches.spawn(async move {
            match pending.outcome().await {
                Ok(outcome) => {
                    if outcome.is_loaded() {
                        if let Err(e) = config::save_last_device(&config_dir, Some(id.as_str())) {
                            warn!("Failed to remember last device: {}", e);
                        }
                    }
                    surface.emit(HeadlessEvent::switch(&id, &outcome));
                }
                Err(e) => surface.emit(HeadlessEvent::error(e.to_string(), e.is_fatal())),
            }
        });
    }

    /// Wait for reported switches, then stop the engine and wait for its task
    pub async fn shutdown(self) {
        let mut switches = self.switches.into_inner().unwrap_or_else(|e| e.into_inner());
        while let Some(joined) = switches.join_next().await {
            if let Err(e) = joined {
                warn!("Switch task ended abnormally: {}", e);
            }
        }

        if let Err(e) = self.engine.shutdown().await {
            debug!("Engine already stopped: {}", e);
        }
        if let Err(e) = self.task.await {
            warn!("Engine task ended abnormally: {}", e);
        }
    }
}

fn support_store(settings: &Settings) -> SupportFileStore {
    let dir = settings
        .support
        .directory
        .clone()
        .unwrap_or_else(config::default_support_dir);
    SupportFileStore::new(dir)
}

/// Forward stdin lines to the command loop (blocking, run on its own thread)
fn read_stdin_blocking(line_tx: mpsc::Sender<String>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
