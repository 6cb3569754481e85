//! Engine - single owner of the coordinator
//!
//! The coordinator is mutated only from the task running [`Engine::run`].
//! Everything else talks to it through a cloneable [`EngineHandle`], so two
//! switches can never interleave: a selection that arrives while a recovery
//! download is in flight waits in the channel until the first switch is done.

use std::fmt;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use locswitch_core::prelude::*;
use locswitch_core::{Coordinate, MovementMode, MovementType};
use locswitch_device::{Device, DeviceError, DeviceLoader, SupportFileRecovery};

use crate::coordinator::{DeviceSwitchCoordinator, SwitchOutcome, SwitchPhase};
use crate::host::HostLocationProvider;

const COMMAND_CAPACITY: usize = 64;

/// Point-in-time view of the coordinator for surfaces and tests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub device_id: Option<String>,
    pub location: Option<Coordinate>,
    pub movement_type: Option<MovementType>,
    pub movement_mode: Option<MovementMode>,
    pub phase: SwitchPhase,
    pub cached_locations: usize,
}

impl SessionSnapshot {
    fn capture<L, R>(coordinator: &DeviceSwitchCoordinator<L, R>) -> Self
    where
        L: DeviceLoader,
        R: SupportFileRecovery,
    {
        let session = coordinator.session();
        Self {
            device_id: session.map(|s| s.device().id.clone()),
            location: session.and_then(|s| s.current_location()),
            movement_type: session.map(|s| s.movement_type()),
            movement_mode: session.map(|s| s.movement_mode()),
            phase: coordinator.phase(),
            cached_locations: coordinator.cache().len(),
        }
    }
}

enum Command {
    Select {
        device: Device,
        reply: oneshot::Sender<SwitchOutcome>,
    },
    Disconnected {
        device: Device,
        reply: oneshot::Sender<bool>,
    },
    SetLocation {
        coordinate: Coordinate,
        reply: oneshot::Sender<std::result::Result<bool, DeviceError>>,
    },
    ResetLocation {
        reply: oneshot::Sender<std::result::Result<bool, DeviceError>>,
    },
    SetMovementType {
        movement_type: MovementType,
        reply: oneshot::Sender<bool>,
    },
    MoveToHost {
        reply: oneshot::Sender<Result<bool>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}

impl Command {
    fn description(&self) -> &'static str {
        match self {
            Command::Select { .. } => "select device",
            Command::Disconnected { .. } => "device disconnected",
            Command::SetLocation { .. } => "set location",
            Command::ResetLocation { .. } => "reset location",
            Command::SetMovementType { .. } => "set movement type",
            Command::MoveToHost { .. } => "move to host location",
            Command::Snapshot { .. } => "snapshot",
            Command::Shutdown => "shutdown",
        }
    }
}

/// Owns the coordinator and the host location provider
pub struct Engine<L, R, H> {
    coordinator: DeviceSwitchCoordinator<L, R>,
    host: H,
    cmd_rx: mpsc::Receiver<Command>,
}

impl<L, R, H> Engine<L, R, H>
where
    L: DeviceLoader + Send + Sync + 'static,
    R: SupportFileRecovery + Send + Sync + 'static,
    H: HostLocationProvider + Send + Sync + 'static,
{
    /// Create an engine and the handle used to drive it
    pub fn new(coordinator: DeviceSwitchCoordinator<L, R>, host: H) -> (Self, EngineHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
        let engine = Self {
            coordinator,
            host,
            cmd_rx,
        };
        (engine, EngineHandle { cmd_tx })
    }

    /// Create an engine and run it on a new tokio task
    pub fn spawn(
        coordinator: DeviceSwitchCoordinator<L, R>,
        host: H,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (engine, handle) = Self::new(coordinator, host);
        let task = tokio::spawn(engine.run());
        (handle, task)
    }

    /// Process commands until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        info!("Engine started");
        while let Some(command) = self.cmd_rx.recv().await {
            trace!("Engine command: {}", command.description());
            if !self.handle(command).await {
                break;
            }
        }
        info!("Engine stopped");
    }

    /// Returns false when the loop should stop
    async fn handle(&mut self, command: Command) -> bool {
        // A dropped reply receiver means the caller gave up waiting; the
        // command has still been applied.
        match command {
            Command::Select { device, reply } => {
                let outcome = self.coordinator.select_device(&device).await;
                let _ = reply.send(outcome);
            }
            Command::Disconnected { device, reply } => {
                let _ = reply.send(self.coordinator.device_disconnected(&device));
            }
            Command::SetLocation { coordinate, reply } => {
                let _ = reply.send(self.coordinator.set_location(coordinate));
            }
            Command::ResetLocation { reply } => {
                let _ = reply.send(self.coordinator.reset_location());
            }
            Command::SetMovementType {
                movement_type,
                reply,
            } => {
                let _ = reply.send(self.coordinator.set_movement_type(movement_type));
            }
            Command::MoveToHost { reply } => {
                let result = self.coordinator.move_to_host_location(&self.host).await;
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(SessionSnapshot::capture(&self.coordinator));
            }
            Command::Shutdown => return false,
        }
        true
    }
}

/// Cloneable sender side of the engine
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<Command>,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("cmd_tx", &"<channel>")
            .finish()
    }
}

/// A switch that has been queued but not necessarily started
///
/// Commands queued after it run after it, whether or not anyone waits here.
#[derive(Debug)]
pub struct PendingSwitch {
    response: oneshot::Receiver<SwitchOutcome>,
}

impl PendingSwitch {
    /// Wait for the switch to finish
    pub async fn outcome(self) -> Result<SwitchOutcome> {
        self.response.await.map_err(|_| Error::ChannelClosed)
    }
}

impl EngineHandle {
    async fn enqueue<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<oneshot::Receiver<T>> {
        let (reply, response) = oneshot::channel();
        self.cmd_tx
            .send(make(reply))
            .await
            .map_err(|_| Error::channel_send("engine command"))?;
        Ok(response)
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        self.enqueue(make)
            .await?
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    pub async fn select_device(&self, device: Device) -> Result<SwitchOutcome> {
        self.queue_select(device).await?.outcome().await
    }

    /// Queue a switch without waiting for it to run
    pub async fn queue_select(&self, device: Device) -> Result<PendingSwitch> {
        let response = self
            .enqueue(|reply| Command::Select { device, reply })
            .await?;
        Ok(PendingSwitch { response })
    }

    pub async fn device_disconnected(&self, device: Device) -> Result<bool> {
        self.request(|reply| Command::Disconnected { device, reply })
            .await
    }

    pub async fn set_location(&self, coordinate: Coordinate) -> Result<bool> {
        Ok(self
            .request(|reply| Command::SetLocation { coordinate, reply })
            .await??)
    }

    pub async fn reset_location(&self) -> Result<bool> {
        Ok(self
            .request(|reply| Command::ResetLocation { reply })
            .await??)
    }

    pub async fn set_movement_type(&self, movement_type: MovementType) -> Result<bool> {
        self.request(|reply| Command::SetMovementType {
            movement_type,
            reply,
        })
        .await
    }

    pub async fn move_to_host_location(&self) -> Result<bool> {
        self.request(|reply| Command::MoveToHost { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Ask the engine loop to stop after the commands already queued
    pub async fn shutdown(&self) -> Result<()> {
        self.cmd_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| Error::channel_send("engine shutdown"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controls::MovementControls;
    use crate::coordinator::Collaborators;
    use crate::host::StaticHostLocation;
    use crate::ui::{MockErrorIndicator, MockStatusSink};
    use locswitch_device::test_utils::{
        test_device, RecordingObserver, ScriptedLoader, ScriptedRecovery,
    };
    use locswitch_device::DeviceRegistry;

    fn collaborators(registry: Arc<DeviceRegistry>) -> Collaborators {
        let mut status = MockStatusSink::new();
        status.expect_set_status().return_const(());
        let mut indicator = MockErrorIndicator::new();
        indicator.expect_show().return_const(());
        indicator.expect_hide().return_const(());

        Collaborators {
            status: Arc::new(status),
            error_indicator: Arc::new(indicator),
            hooks: Arc::new(RecordingObserver::new()),
            selection: registry,
            movement: Arc::new(MovementControls::new(Some(MovementType::Cycle))),
        }
    }

    fn spawn_engine(
        loader: ScriptedLoader,
        host: StaticHostLocation,
    ) -> (EngineHandle, JoinHandle<()>, Arc<DeviceRegistry>) {
        let registry = Arc::new(DeviceRegistry::with_devices([
            test_device("a", "A"),
            test_device("b", "B"),
        ]));
        let coordinator = DeviceSwitchCoordinator::new(
            loader,
            ScriptedRecovery::succeeding(),
            collaborators(registry.clone()),
        );
        let (handle, task) = Engine::spawn(coordinator, host);
        (handle, task, registry)
    }

    #[tokio::test]
    async fn test_snapshot_before_any_selection() {
        let (handle, _task, _) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());

        let snapshot = handle.snapshot().await.unwrap();

        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[tokio::test]
    async fn test_select_and_snapshot() {
        let (handle, _task, registry) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());
        let a = registry.select_by_id("a").unwrap();

        let outcome = handle.select_device(a).await.unwrap();
        assert!(outcome.is_loaded());

        handle.set_location(Coordinate::new(1.0, 1.0)).await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();

        assert_eq!(snapshot.device_id.as_deref(), Some("a"));
        assert_eq!(snapshot.location, Some(Coordinate::new(1.0, 1.0)));
        assert_eq!(snapshot.movement_type, Some(MovementType::Cycle));
        assert_eq!(snapshot.movement_mode, Some(MovementMode::Manual));
        assert_eq!(snapshot.phase, SwitchPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_round_trip_through_engine() {
        let (handle, _task, registry) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());

        let a = registry.select_by_id("a").unwrap();
        handle.select_device(a.clone()).await.unwrap();
        handle.set_location(Coordinate::new(1.0, 1.0)).await.unwrap();

        let b = registry.select_by_id("b").unwrap();
        handle.select_device(b).await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().cached_locations, 1);

        registry.select_by_id("a");
        let outcome = handle.select_device(a).await.unwrap();
        assert_eq!(
            outcome,
            SwitchOutcome::Loaded {
                restored: Some(Coordinate::new(1.0, 1.0)),
                retried: false
            }
        );
    }

    #[tokio::test]
    async fn test_queued_switches_run_in_order() {
        let (handle, _task, registry) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());
        let a = registry.select_by_id("a").unwrap();
        let first = handle.queue_select(a).await.unwrap();
        let b = registry.select_by_id("b").unwrap();
        let second = handle.queue_select(b).await.unwrap();

        // Not waiting on either switch: the snapshot still queues behind both
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.device_id.as_deref(), Some("b"));
        assert_eq!(snapshot.phase, SwitchPhase::Succeeded);

        assert!(first.outcome().await.unwrap().is_loaded());
        assert!(second.outcome().await.unwrap().is_loaded());
    }

    #[tokio::test]
    async fn test_device_error_becomes_core_error() {
        let loader = ScriptedLoader::new();
        let (handle, _task, registry) =
            spawn_engine(loader.clone(), StaticHostLocation::disabled());
        let a = registry.select_by_id("a").unwrap();
        handle.select_device(a).await.unwrap();

        loader
            .transport("a")
            .unwrap()
            .fail_with(DeviceError::Disconnected);
        let err = handle
            .set_location(Coordinate::new(1.0, 1.0))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Device { .. }));
    }

    #[tokio::test]
    async fn test_move_to_host_location() {
        let fix = Coordinate::new(40.7128, -74.006);
        let (handle, _task, registry) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::new(true, Some(fix)));
        let a = registry.select_by_id("a").unwrap();
        handle.select_device(a).await.unwrap();

        assert!(handle.move_to_host_location().await.unwrap());
        assert_eq!(handle.snapshot().await.unwrap().location, Some(fix));
    }

    #[tokio::test]
    async fn test_move_to_host_location_disabled() {
        let (handle, _task, _) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());

        let err = handle.move_to_host_location().await.unwrap_err();
        assert!(matches!(err, Error::HostLocationDisabled));
    }

    #[tokio::test]
    async fn test_disconnect_through_engine() {
        let (handle, _task, registry) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());
        let a = registry.select_by_id("a").unwrap();
        handle.select_device(a.clone()).await.unwrap();

        assert!(handle.device_disconnected(a).await.unwrap());
        assert!(handle.snapshot().await.unwrap().device_id.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let (handle, task, _) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let err = handle.snapshot().await.unwrap_err();
        assert!(matches!(err, Error::ChannelSend { .. }));
    }

    #[tokio::test]
    async fn test_loop_ends_when_handles_dropped() {
        let (handle, task, _) =
            spawn_engine(ScriptedLoader::new(), StaticHostLocation::disabled());
        drop(handle);
        task.await.unwrap();
    }
}
