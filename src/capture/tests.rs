use super::*;
use crate::catalog::{MediaCatalog, MediaKind};
use crate::config::{CaptureConfig, PocketcamConfig};
use crate::error::PocketcamError;
use crate::events::{EventBus, EventFilter, EventReceiver, MediaEvent};
use crate::permissions::{PermissionDomain, PermissionGate, StaticPermissionProvider};
use crate::staging::MediaStagingStore;
use crate::storage::{Filesystem, LocalFilesystem};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    scratch: PathBuf,
    device: Arc<MockCaptureDevice>,
    gate: Arc<PermissionGate>,
    staging: Arc<MediaStagingStore>,
    event_bus: Arc<EventBus>,
    controller: Arc<CaptureController>,
}

fn capture_config() -> CaptureConfig {
    let mut config = PocketcamConfig::default().capture;
    config.file_prefix = "test".to_string();
    config
}

fn create_fixture(device_timeout: Duration) -> Fixture {
    let root = TempDir::new().unwrap();
    let scratch = root.path().join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();

    let event_bus = Arc::new(EventBus::new(64));
    let filesystem: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let catalog = Arc::new(MediaCatalog::new(
        root.path().join("media"),
        Arc::clone(&filesystem),
        Arc::clone(&event_bus),
    ));
    let staging = Arc::new(MediaStagingStore::new(
        filesystem,
        catalog,
        Arc::clone(&event_bus),
    ));
    let gate = Arc::new(PermissionGate::new(
        Arc::new(StaticPermissionProvider::new(true)),
        Arc::clone(&event_bus),
        Duration::from_secs(5),
    ));
    let device = Arc::new(MockCaptureDevice::new(&scratch));
    let controller = Arc::new(CaptureController::new(
        capture_config(),
        device_timeout,
        Arc::clone(&device) as Arc<dyn CaptureDevice>,
        Arc::clone(&gate),
        Arc::clone(&staging),
        Arc::clone(&event_bus),
    ));

    Fixture {
        _root: root,
        scratch,
        device,
        gate,
        staging,
        event_bus,
        controller,
    }
}

async fn granted_fixture() -> Fixture {
    let fixture = create_fixture(Duration::from_secs(5));
    fixture.gate.request(PermissionDomain::Capture).await.unwrap();
    fixture
}

fn scratch_files(fixture: &Fixture) -> usize {
    std::fs::read_dir(&fixture.scratch).unwrap().count()
}

async fn wait_until_idle(controller: &CaptureController) {
    for _ in 0..100 {
        if controller.activity() == CaptureActivity::Idle {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("controller never returned to idle");
}

fn failures(event_bus: &EventBus) -> EventReceiver {
    event_bus.subscribe_filtered(EventFilter::EventTypes(vec!["capture_failed"]), "test")
}

#[tokio::test]
async fn test_photo_capture_stages_jpeg() {
    let fixture = granted_fixture().await;

    let outcome = fixture.controller.capture().await.unwrap();

    let CaptureOutcome::Staged(media) = outcome else {
        panic!("expected staged photo, got {:?}", outcome);
    };
    assert_eq!(media.kind, MediaKind::Photo);
    assert!(media.suggested_name.starts_with("test_"));
    assert!(media.suggested_name.ends_with("Z.jpg"));
    assert!(media.temporary_path.exists());
    assert_eq!(fixture.staging.pending(), Some(media));
    assert_eq!(fixture.controller.activity(), CaptureActivity::Idle);
}

#[tokio::test]
async fn test_photo_options_follow_session() {
    let fixture = granted_fixture().await;
    assert_eq!(fixture.controller.switch_facing(), CameraFacing::Front);

    fixture.controller.capture().await.unwrap();

    let requests = fixture.device.photo_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].facing, CameraFacing::Front);
    assert_eq!(requests[0].quality, capture_config().photo_quality);
}

#[tokio::test]
async fn test_capture_while_staged_is_rejected() {
    let fixture = granted_fixture().await;
    fixture.controller.capture().await.unwrap();
    let staged = fixture.staging.pending();

    let result = fixture.controller.capture().await;

    assert!(matches!(result, Err(PocketcamError::StagingOccupied)));
    assert_eq!(fixture.staging.pending(), staged);
    assert_eq!(fixture.device.photo_requests().len(), 1);
}

#[tokio::test]
async fn test_capture_requires_permission() {
    let fixture = create_fixture(Duration::from_secs(5));

    let result = fixture.controller.capture().await;

    assert!(matches!(
        result,
        Err(PocketcamError::PermissionDenied {
            domain: PermissionDomain::Capture
        })
    ));
    assert!(fixture.device.photo_requests().is_empty());
    assert!(!fixture.staging.is_occupied());
}

#[tokio::test]
async fn test_capture_requires_device() {
    let fixture = granted_fixture().await;
    fixture.device.set_available(false);

    assert!(matches!(
        fixture.controller.capture().await,
        Err(PocketcamError::DeviceUnavailable)
    ));
    assert!(fixture.device.photo_requests().is_empty());
}

#[tokio::test]
async fn test_photo_failure_stages_nothing() {
    let fixture = granted_fixture().await;
    let mut failed = failures(&fixture.event_bus);
    fixture.device.set_fail_photos(true);

    let result = fixture.controller.capture().await;

    assert!(matches!(result, Err(PocketcamError::CaptureFailure { .. })));
    assert!(!fixture.staging.is_occupied());
    assert_eq!(fixture.controller.activity(), CaptureActivity::Idle);
    assert_eq!(failed.drain().len(), 1);
}

#[tokio::test]
async fn test_second_press_while_photo_in_flight_is_busy() {
    let fixture = granted_fixture().await;
    fixture
        .device
        .set_photo_delay(Some(Duration::from_millis(200)));

    let controller = Arc::clone(&fixture.controller);
    let first = tokio::spawn(async move { controller.capture().await });

    while fixture.controller.activity() != CaptureActivity::TakingPhoto {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        fixture.controller.capture().await,
        Err(PocketcamError::CaptureBusy)
    ));
    // Switching is also blocked while the shutter is busy
    assert_eq!(fixture.controller.switch_mode(), CaptureMode::Photo);

    assert!(matches!(
        first.await.unwrap(),
        Ok(CaptureOutcome::Staged(_))
    ));
}

#[tokio::test]
async fn test_abandoned_photo_returns_to_idle() {
    let fixture = granted_fixture().await;
    fixture
        .device
        .set_photo_delay(Some(Duration::from_millis(500)));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), fixture.controller.capture()).await;

    assert!(abandoned.is_err());
    assert_eq!(fixture.controller.activity(), CaptureActivity::Idle);
    assert!(!fixture.staging.is_occupied());

    fixture.device.set_photo_delay(None);
    assert!(matches!(
        fixture.controller.capture().await,
        Ok(CaptureOutcome::Staged(_))
    ));
}

#[tokio::test]
async fn test_mode_switch_ignored_while_staged() {
    let fixture = granted_fixture().await;
    fixture.controller.capture().await.unwrap();
    assert!(fixture.staging.is_occupied());

    assert_eq!(fixture.controller.switch_mode(), CaptureMode::Photo);
    assert_eq!(fixture.controller.session().mode, CaptureMode::Photo);

    // Facing is not tied to the staged kind
    assert_eq!(fixture.controller.switch_facing(), CameraFacing::Front);
}

#[tokio::test]
async fn test_video_capture_start_and_stop() {
    let fixture = granted_fixture().await;
    assert_eq!(fixture.controller.switch_mode(), CaptureMode::Video);

    let started = fixture.controller.capture().await.unwrap();
    assert_eq!(started, CaptureOutcome::RecordingStarted);
    assert!(fixture.controller.session().recording);
    assert!(fixture.device.is_recording());

    let stopped = fixture.controller.capture().await.unwrap();

    let CaptureOutcome::Staged(media) = stopped else {
        panic!("expected staged video, got {:?}", stopped);
    };
    assert_eq!(media.kind, MediaKind::Video);
    assert!(media.suggested_name.ends_with("Z.mp4"));
    assert!(!fixture.controller.session().recording);
    assert_eq!(fixture.staging.pending(), Some(media));
}

#[tokio::test]
async fn test_second_press_while_stopping_is_busy() {
    let fixture = granted_fixture().await;
    let mut failed = failures(&fixture.event_bus);
    fixture.controller.switch_mode();
    fixture.controller.capture().await.unwrap();
    fixture
        .device
        .set_stop_delay(Some(Duration::from_millis(200)));

    let controller = Arc::clone(&fixture.controller);
    let first = tokio::spawn(async move { controller.capture().await });

    while fixture.controller.activity() != CaptureActivity::Stopping {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        fixture.controller.capture().await,
        Err(PocketcamError::CaptureBusy)
    ));
    assert!(fixture.controller.session().recording);

    assert!(matches!(
        first.await.unwrap(),
        Ok(CaptureOutcome::Staged(_))
    ));
    assert!(failed.drain().is_empty());
    assert_eq!(fixture.controller.activity(), CaptureActivity::Idle);
}

#[tokio::test]
async fn test_abandoned_stop_keeps_recording() {
    let fixture = granted_fixture().await;
    fixture.controller.switch_mode();
    fixture.controller.capture().await.unwrap();
    fixture
        .device
        .set_stop_delay(Some(Duration::from_millis(500)));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), fixture.controller.capture()).await;

    assert!(abandoned.is_err());
    assert_eq!(fixture.controller.activity(), CaptureActivity::Recording);
    assert!(fixture.device.is_recording());

    fixture.device.set_stop_delay(None);
    let stopped = fixture.controller.capture().await.unwrap();
    assert!(matches!(stopped, CaptureOutcome::Staged(_)));
    assert!(!fixture.controller.session().recording);
}

#[tokio::test]
async fn test_switches_are_ignored_while_recording() {
    let fixture = granted_fixture().await;
    fixture.controller.switch_mode();
    fixture.controller.capture().await.unwrap();

    assert_eq!(fixture.controller.switch_facing(), CameraFacing::Back);
    assert_eq!(fixture.controller.switch_mode(), CaptureMode::Video);

    let session = fixture.controller.session();
    assert_eq!(session.mode, CaptureMode::Video);
    assert_eq!(session.facing, CameraFacing::Back);
    assert!(session.recording);
}

#[tokio::test]
async fn test_recording_failure_discards_partial_file() {
    let fixture = granted_fixture().await;
    let mut failed = failures(&fixture.event_bus);
    fixture.controller.switch_mode();
    fixture.controller.capture().await.unwrap();
    assert_eq!(scratch_files(&fixture), 1);

    assert!(fixture.device.fail_active_recording("disk full"));
    wait_until_idle(&fixture.controller).await;

    assert!(!fixture.controller.session().recording);
    assert!(!fixture.staging.is_occupied());
    assert_eq!(scratch_files(&fixture), 0);
    match failed.try_recv().unwrap() {
        Some(MediaEvent::CaptureFailed { details }) => assert!(details.contains("disk full")),
        other => panic!("expected capture failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_recording_start_failure_returns_to_idle() {
    let fixture = granted_fixture().await;
    fixture.controller.switch_mode();
    fixture.device.set_fail_recording_start(true);

    assert!(fixture.controller.capture().await.is_err());
    assert!(!fixture.controller.session().recording);
    assert!(!fixture.staging.is_occupied());
}

#[tokio::test]
async fn test_shutdown_stops_active_recording() {
    let fixture = granted_fixture().await;
    fixture.controller.switch_mode();
    fixture.controller.capture().await.unwrap();

    let staged = fixture.controller.shutdown().await.unwrap();

    assert!(!fixture.device.is_recording());
    assert_eq!(staged.map(|media| media.kind), Some(MediaKind::Video));
    assert_eq!(fixture.controller.activity(), CaptureActivity::Idle);
}

#[tokio::test]
async fn test_shutdown_cancels_unresponsive_recording() {
    let fixture = create_fixture(Duration::from_millis(100));
    fixture.gate.request(PermissionDomain::Capture).await.unwrap();
    fixture.controller.switch_mode();
    fixture.controller.capture().await.unwrap();
    fixture.device.set_hang_on_stop(true);

    let result = fixture.controller.shutdown().await;

    assert!(matches!(result, Err(PocketcamError::Timeout { .. })));
    assert_eq!(fixture.controller.activity(), CaptureActivity::Idle);
    assert!(!fixture.staging.is_occupied());
}

#[tokio::test]
async fn test_shutdown_when_idle_is_noop() {
    let fixture = granted_fixture().await;
    assert_eq!(fixture.controller.shutdown().await.unwrap(), None);
}
