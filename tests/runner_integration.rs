//! End-to-end tests driving the runner against real support-file directories

use std::path::Path;
use std::sync::Arc;

use locswitch::headless::command::HeadlessCommand;
use locswitch::{OutputFormat, Runner};
use locswitch_app::config::{self, DeviceEntry, HostSettings, Settings, SupportSettings};
use locswitch_app::{SwitchOutcome, SwitchPhase};
use locswitch_core::{ConnectionKind, Coordinate, Error, MovementMode, MovementType};
use locswitch_device::{
    MirrorRecovery, SupportFileRecovery, SupportFileStore, SUPPORT_FILE_NAMES,
};
use tempfile::TempDir;
use tokio::sync::Notify;

fn seed(root: &Path, version: &str) {
    let dir = root.join("iOS").join(version);
    std::fs::create_dir_all(&dir).unwrap();
    for name in SUPPORT_FILE_NAMES {
        std::fs::write(dir.join(name), b"image").unwrap();
    }
}

fn entry(id: &str, os_version: &str, paired: bool) -> DeviceEntry {
    DeviceEntry {
        id: id.to_string(),
        name: format!("iPhone {}", id),
        connection: ConnectionKind::Usb,
        os: "iOS".to_string(),
        os_version: os_version.to_string(),
        paired,
    }
}

/// Device `a` is ready, `b` needs its support files from the mirror, `c` is unpaired
fn setup(temp: &TempDir) -> Settings {
    let store = temp.path().join("support");
    let mirror = temp.path().join("mirror");
    seed(&store, "17.4");
    seed(&mirror, "16.4");

    Settings {
        support: SupportSettings {
            directory: Some(store),
            mirror: Some(mirror),
        },
        host: HostSettings {
            enabled: true,
            latitude: Some(37.3349),
            longitude: Some(-122.009),
        },
        devices: vec![
            entry("a", "17.4.1", true),
            entry("b", "16.4", true),
            entry("c", "17.4", false),
        ],
        ..Default::default()
    }
}

fn config_dir(temp: &TempDir) -> std::path::PathBuf {
    temp.path().join("config")
}

/// Mirror recovery that holds each download until the test releases it
struct HeldRecovery {
    inner: MirrorRecovery,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl SupportFileRecovery for HeldRecovery {
    async fn download_support_file(&self, os: &str, version: &str) -> bool {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.download_support_file(os, version).await
    }
}

#[tokio::test]
async fn test_switch_round_trip_restores_location() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Json);

    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();
    runner
        .execute(HeadlessCommand::Set(Coordinate::new(1.0, 1.0)))
        .await
        .unwrap();

    // b is recovered from the mirror and retried once
    runner
        .execute(HeadlessCommand::Select("b".into()))
        .await
        .unwrap();
    let snapshot = runner.engine().snapshot().await.unwrap();
    assert_eq!(snapshot.device_id.as_deref(), Some("b"));
    assert!(snapshot.location.is_none());
    assert_eq!(snapshot.cached_locations, 1);
    assert!(temp
        .path()
        .join("support/iOS/16.4/DeveloperDiskImage.dmg")
        .is_file());

    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();
    let snapshot = runner.engine().snapshot().await.unwrap();
    assert_eq!(snapshot.device_id.as_deref(), Some("a"));
    assert_eq!(snapshot.location, Some(Coordinate::new(1.0, 1.0)));
    assert_eq!(snapshot.movement_mode, Some(MovementMode::Manual));

    runner.shutdown().await;
}

#[tokio::test]
async fn test_unpaired_device_fails_without_binding() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Json);

    runner
        .execute(HeadlessCommand::Select("c".into()))
        .await
        .unwrap();

    let snapshot = runner.engine().snapshot().await.unwrap();
    assert!(snapshot.device_id.is_none());
    assert_eq!(snapshot.phase, SwitchPhase::Failed);

    runner.shutdown().await;
}

#[tokio::test]
async fn test_missing_mirror_means_recovery_failure() {
    let temp = TempDir::new().unwrap();
    let mut settings = setup(&temp);
    settings.support.mirror = Some(temp.path().join("empty-mirror"));
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Text);

    runner
        .execute(HeadlessCommand::Select("b".into()))
        .await
        .unwrap();

    let snapshot = runner.engine().snapshot().await.unwrap();
    assert!(snapshot.device_id.is_none());
    assert!(!temp.path().join("support/iOS/16.4").exists());

    runner.shutdown().await;
}

#[tokio::test]
async fn test_unknown_device_is_an_error() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Json);

    let err = runner
        .execute(HeadlessCommand::Select("zzz".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDevice { .. }));
    assert!(err.is_recoverable());

    runner.shutdown().await;
}

#[tokio::test]
async fn test_last_device_is_restored_on_next_run() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let dir = config_dir(&temp);

    let runner = Runner::new(&dir, &settings, OutputFormat::Json);
    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();
    runner.shutdown().await;

    let prefs = config::load_user_preferences(&dir).unwrap();
    assert_eq!(prefs.last_device.as_deref(), Some("a"));

    let runner = Runner::new(&dir, &settings, OutputFormat::Json);
    runner.restore_last_device().await.unwrap();
    let snapshot = runner.engine().snapshot().await.unwrap();
    assert_eq!(snapshot.device_id.as_deref(), Some("a"));
    assert_eq!(runner.registry().selected_device().unwrap().id, "a");
    runner.shutdown().await;
}

#[tokio::test]
async fn test_movement_type_is_applied_and_remembered() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let dir = config_dir(&temp);
    let runner = Runner::new(&dir, &settings, OutputFormat::Json);

    runner
        .execute(HeadlessCommand::Move(MovementType::Drive))
        .await
        .unwrap();
    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();

    let snapshot = runner.engine().snapshot().await.unwrap();
    assert_eq!(snapshot.movement_type, Some(MovementType::Drive));

    let prefs = config::load_user_preferences(&dir).unwrap();
    assert_eq!(prefs.last_movement_type, Some(MovementType::Drive));
    runner.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_unbinds_and_forgets_device() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Json);

    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();
    runner
        .execute(HeadlessCommand::Disconnect("a".into()))
        .await
        .unwrap();

    assert!(runner.registry().find("a").is_none());
    assert!(runner.registry().selected_index().is_none());
    let snapshot = runner.engine().snapshot().await.unwrap();
    assert!(snapshot.device_id.is_none());

    runner.shutdown().await;
}

#[tokio::test]
async fn test_host_location() {
    let temp = TempDir::new().unwrap();
    let mut settings = setup(&temp);
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Json);

    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();
    runner.execute(HeadlessCommand::Host).await.unwrap();
    let snapshot = runner.engine().snapshot().await.unwrap();
    assert_eq!(snapshot.location, Some(Coordinate::new(37.3349, -122.009)));
    runner.shutdown().await;

    settings.host.enabled = false;
    let runner = Runner::new(&config_dir(&temp), &settings, OutputFormat::Json);
    let err = runner.execute(HeadlessCommand::Host).await.unwrap_err();
    assert!(matches!(err, Error::HostLocationDisabled));
    runner.shutdown().await;
}

#[tokio::test]
async fn test_selection_during_recovery_supersedes_retry() {
    let temp = TempDir::new().unwrap();
    let settings = setup(&temp);
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let recovery = HeldRecovery {
        inner: MirrorRecovery::new(
            temp.path().join("mirror"),
            SupportFileStore::new(temp.path().join("support")),
        ),
        started: started.clone(),
        release: release.clone(),
    };
    let runner = Runner::with_recovery(
        &config_dir(&temp),
        &settings,
        OutputFormat::Json,
        recovery,
    );

    let switch_to_b = runner.select("b").await.unwrap();
    started.notified().await;

    // The operator picks a while b's support files are still downloading
    runner
        .execute(HeadlessCommand::Select("a".into()))
        .await
        .unwrap();
    assert_eq!(runner.registry().selected_device().unwrap().id, "a");
    release.notify_one();

    assert_eq!(switch_to_b.outcome().await.unwrap(), SwitchOutcome::Superseded);
    assert!(temp
        .path()
        .join("support/iOS/16.4/DeveloperDiskImage.dmg")
        .is_file());

    let snapshot = runner.engine().snapshot().await.unwrap();
    assert_eq!(snapshot.device_id.as_deref(), Some("a"));
    assert_eq!(snapshot.phase, SwitchPhase::Succeeded);

    runner.shutdown().await;
}
