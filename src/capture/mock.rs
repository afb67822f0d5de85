use super::device::{CaptureDevice, PhotoOptions, RecordingOptions, RecordingOutcome};
use crate::error::{PocketcamError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

struct ActiveRecording {
    sender: oneshot::Sender<RecordingOutcome>,
    path: PathBuf,
}

/// Mock capture device for testing without camera hardware.
/// Writes small placeholder files into a scratch directory.
pub struct MockCaptureDevice {
    scratch_dir: PathBuf,
    available: AtomicBool,
    fail_photos: AtomicBool,
    fail_recording_start: AtomicBool,
    hang_on_stop: AtomicBool,
    photo_delay: Mutex<Option<Duration>>,
    stop_delay: Mutex<Option<Duration>>,
    active: Mutex<Option<ActiveRecording>>,
    photo_requests: Mutex<Vec<PhotoOptions>>,
}

impl MockCaptureDevice {
    pub fn new<P: Into<PathBuf>>(scratch_dir: P) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            available: AtomicBool::new(true),
            fail_photos: AtomicBool::new(false),
            fail_recording_start: AtomicBool::new(false),
            hang_on_stop: AtomicBool::new(false),
            photo_delay: Mutex::new(None),
            stop_delay: Mutex::new(None),
            active: Mutex::new(None),
            photo_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_fail_photos(&self, fail: bool) {
        self.fail_photos.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_recording_start(&self, fail: bool) {
        self.fail_recording_start.store(fail, Ordering::SeqCst);
    }

    /// Accept stop requests without ever delivering the recording outcome
    pub fn set_hang_on_stop(&self, hang: bool) {
        self.hang_on_stop.store(hang, Ordering::SeqCst);
    }

    pub fn set_photo_delay(&self, delay: Option<Duration>) {
        *self.photo_delay.lock() = delay;
    }

    pub fn set_stop_delay(&self, delay: Option<Duration>) {
        *self.stop_delay.lock() = delay;
    }

    pub fn is_recording(&self) -> bool {
        self.active.lock().is_some()
    }

    pub fn photo_requests(&self) -> Vec<PhotoOptions> {
        self.photo_requests.lock().clone()
    }

    /// Simulate the device aborting the active recording on its own
    pub fn fail_active_recording(&self, details: &str) -> bool {
        let active = self.active.lock().take();
        match active {
            Some(recording) => {
                let _ = recording.sender.send(RecordingOutcome::Failed {
                    details: details.to_string(),
                    partial: Some(recording.path),
                });
                true
            }
            None => false,
        }
    }

    async fn write_placeholder(&self, extension: &str) -> Result<PathBuf> {
        let path = self
            .scratch_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        write_file(&path).await?;
        Ok(path)
    }
}

async fn write_file(path: &Path) -> Result<()> {
    tokio::fs::write(path, b"mock media")
        .await
        .map_err(|e| PocketcamError::capture_failure(format!("mock write failed: {}", e)))
}

#[async_trait]
impl CaptureDevice for MockCaptureDevice {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn take_photo(&self, options: &PhotoOptions) -> Result<PathBuf> {
        self.photo_requests.lock().push(*options);

        let delay = *self.photo_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(PocketcamError::capture_failure("mock photo failure"));
        }

        let path = self.write_placeholder("jpg").await?;
        debug!("Mock photo written to {}", path.display());
        Ok(path)
    }

    async fn start_recording(
        &self,
        _options: &RecordingOptions,
    ) -> Result<oneshot::Receiver<RecordingOutcome>> {
        if self.fail_recording_start.load(Ordering::SeqCst) {
            return Err(PocketcamError::capture_failure("mock recording failure"));
        }
        if self.is_recording() {
            return Err(PocketcamError::capture_failure("already recording"));
        }

        let path = self.write_placeholder("mp4").await?;
        let (sender, receiver) = oneshot::channel();
        *self.active.lock() = Some(ActiveRecording { sender, path });
        Ok(receiver)
    }

    async fn stop_recording(&self) -> Result<()> {
        let delay = *self.stop_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.hang_on_stop.load(Ordering::SeqCst) {
            debug!("Mock device ignoring stop request");
            return Ok(());
        }

        let active = self.active.lock().take();
        let recording =
            active.ok_or_else(|| PocketcamError::capture_failure("no active recording"))?;
        let _ = recording.sender.send(RecordingOutcome::Finished {
            path: recording.path,
        });
        Ok(())
    }
}
