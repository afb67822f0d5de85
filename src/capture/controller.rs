use super::device::{CaptureDevice, PhotoOptions, RecordingOptions, RecordingOutcome};
use super::session::{capture_file_name, CameraFacing, CaptureActivity, CaptureMode, CaptureSession};
use crate::catalog::MediaKind;
use crate::config::CaptureConfig;
use crate::error::{PocketcamError, Result};
use crate::events::{EventBus, MediaEvent};
use crate::permissions::{PermissionDomain, PermissionGate};
use crate::staging::{MediaStagingStore, StagedMedia};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of a successful `capture()` press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A photo was taken or a recording was stopped; the file waits in staging
    Staged(StagedMedia),
    /// Video mode: the device is now recording
    RecordingStarted,
}

#[derive(Debug)]
struct ControllerState {
    mode: CaptureMode,
    facing: CameraFacing,
    activity: CaptureActivity,
}

/// Background task waiting for the device's terminal recording outcome
struct RecordingTask {
    token: CancellationToken,
    handle: JoinHandle<Result<StagedMedia>>,
}

/// Drives the capture device for photo and video capture and feeds the staging slot
pub struct CaptureController {
    state: Arc<Mutex<ControllerState>>,
    recording: Mutex<Option<RecordingTask>>,
    device: Arc<dyn CaptureDevice>,
    gate: Arc<PermissionGate>,
    staging: Arc<MediaStagingStore>,
    event_bus: Arc<EventBus>,
    config: CaptureConfig,
    device_timeout: Duration,
}

impl CaptureController {
    pub fn new(
        config: CaptureConfig,
        device_timeout: Duration,
        device: Arc<dyn CaptureDevice>,
        gate: Arc<PermissionGate>,
        staging: Arc<MediaStagingStore>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let state = ControllerState {
            mode: CaptureMode::Photo,
            facing: config.default_facing,
            activity: CaptureActivity::Idle,
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            recording: Mutex::new(None),
            device,
            gate,
            staging,
            event_bus,
            config,
            device_timeout,
        }
    }

    pub fn session(&self) -> CaptureSession {
        let state = self.state.lock();
        CaptureSession {
            mode: state.mode,
            facing: state.facing,
            recording: matches!(
                state.activity,
                CaptureActivity::Recording | CaptureActivity::Stopping
            ),
        }
    }

    pub fn activity(&self) -> CaptureActivity {
        self.state.lock().activity
    }

    /// Toggle back/front. Ignored while the device is busy.
    pub fn switch_facing(&self) -> CameraFacing {
        let facing = {
            let mut state = self.state.lock();
            if state.activity != CaptureActivity::Idle {
                debug!("Ignoring facing switch while {:?}", state.activity);
                return state.facing;
            }
            state.facing = state.facing.toggled();
            state.facing
        };

        info!("Camera facing switched to {:?}", facing);
        self.event_bus.emit(MediaEvent::CameraFacingChanged { facing });
        facing
    }

    /// Toggle photo/video. Ignored while the device is busy or a capture awaits resolution.
    pub fn switch_mode(&self) -> CaptureMode {
        let mode = {
            let mut state = self.state.lock();
            if state.activity != CaptureActivity::Idle {
                debug!("Ignoring mode switch while {:?}", state.activity);
                return state.mode;
            }
            if self.staging.is_occupied() {
                debug!("Ignoring mode switch while staged media is pending");
                return state.mode;
            }
            state.mode = state.mode.toggled();
            state.mode
        };

        info!("Capture mode switched to {:?}", mode);
        self.event_bus.emit(MediaEvent::CaptureModeChanged { mode });
        mode
    }

    /// The capture button: take a photo, start a recording, or stop the active one
    pub async fn capture(&self) -> Result<CaptureOutcome> {
        self.gate.require(PermissionDomain::Capture)?;
        if !self.device.is_available() {
            return Err(PocketcamError::DeviceUnavailable);
        }

        let next = {
            let mut state = self.state.lock();
            match state.activity {
                CaptureActivity::TakingPhoto | CaptureActivity::Stopping => {
                    return Err(PocketcamError::CaptureBusy)
                }
                CaptureActivity::Recording => {
                    state.activity = CaptureActivity::Stopping;
                    None
                }
                CaptureActivity::Idle => {
                    if self.staging.is_occupied() {
                        debug!("Capture refused: staged media pending");
                        return Err(PocketcamError::StagingOccupied);
                    }
                    state.activity = match state.mode {
                        CaptureMode::Photo => CaptureActivity::TakingPhoto,
                        CaptureMode::Video => CaptureActivity::Recording,
                    };
                    Some((state.mode, state.facing))
                }
            }
        };

        match next {
            None => self.finish_recording().await.map(CaptureOutcome::Staged),
            Some((CaptureMode::Photo, facing)) => {
                self.take_photo(facing).await.map(CaptureOutcome::Staged)
            }
            Some((CaptureMode::Video, facing)) => self.start_recording(facing).await,
        }
    }

    /// Stop any active recording and cancel the monitor before the capture screen closes.
    /// Returns the staged video when the recording finished cleanly.
    pub async fn shutdown(&self) -> Result<Option<StagedMedia>> {
        let recording = {
            let mut state = self.state.lock();
            let recording = state.activity == CaptureActivity::Recording;
            if recording {
                state.activity = CaptureActivity::Stopping;
            }
            recording
        };

        let result = if recording {
            info!("Stopping active recording before teardown");
            self.finish_recording().await.map(Some)
        } else {
            Ok(None)
        };

        let leftover = self.recording.lock().take();
        if let Some(task) = leftover {
            task.token.cancel();
            if let Err(e) = task.handle.await {
                warn!("Recording monitor ended abnormally: {}", e);
            }
        }

        if let Err(e) = &result {
            warn!("Recording did not stop cleanly during teardown: {}", e);
        }
        info!("Capture controller shut down");
        result
    }

    async fn take_photo(&self, facing: CameraFacing) -> Result<StagedMedia> {
        let options = PhotoOptions {
            quality: self.config.photo_quality,
            facing,
        };

        let _idle =
            ActivityGuard::new(&self.state, CaptureActivity::TakingPhoto, CaptureActivity::Idle);

        debug!("Taking photo with {:?}", options);
        let result = tokio::time::timeout(self.device_timeout, self.device.take_photo(&options)).await;

        let path = match result {
            Ok(Ok(path)) => path,
            Ok(Err(e)) => return Err(report_failure(&self.event_bus, e)),
            Err(_) => {
                return Err(report_failure(
                    &self.event_bus,
                    PocketcamError::timeout("Taking a photo", self.device_timeout),
                ))
            }
        };

        let media = StagedMedia {
            temporary_path: path,
            suggested_name: capture_file_name(&self.config.file_prefix, MediaKind::Photo, Utc::now()),
            kind: MediaKind::Photo,
        };
        stage_capture(&self.staging, media).await
    }

    async fn start_recording(&self, facing: CameraFacing) -> Result<CaptureOutcome> {
        let options = RecordingOptions { facing };
        let starting =
            ActivityGuard::new(&self.state, CaptureActivity::Recording, CaptureActivity::Idle);

        let receiver = match tokio::time::timeout(
            self.device_timeout,
            self.device.start_recording(&options),
        )
        .await
        {
            Ok(Ok(receiver)) => receiver,
            Ok(Err(e)) => return Err(report_failure(&self.event_bus, e)),
            Err(_) => {
                return Err(report_failure(
                    &self.event_bus,
                    PocketcamError::timeout("Starting a recording", self.device_timeout),
                ));
            }
        };

        info!("Recording started ({:?} camera)", facing);
        self.event_bus.emit(MediaEvent::RecordingStarted {
            timestamp: SystemTime::now(),
        });

        let token = CancellationToken::new();
        let monitor = RecordingMonitor {
            state: Arc::clone(&self.state),
            staging: Arc::clone(&self.staging),
            event_bus: Arc::clone(&self.event_bus),
            file_prefix: self.config.file_prefix.clone(),
        };
        let handle = tokio::spawn(monitor.run(receiver, token.clone()));

        *self.recording.lock() = Some(RecordingTask { token, handle });
        starting.disarm();
        Ok(CaptureOutcome::RecordingStarted)
    }

    /// Ask the device to stop and wait for the monitor to stage the result.
    /// If the device refuses or the call is abandoned, the session goes back to recording.
    async fn finish_recording(&self) -> Result<StagedMedia> {
        let stopping =
            ActivityGuard::new(&self.state, CaptureActivity::Stopping, CaptureActivity::Recording);

        match tokio::time::timeout(self.device_timeout, self.device.stop_recording()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(report_failure(&self.event_bus, e)),
            Err(_) => {
                return Err(report_failure(
                    &self.event_bus,
                    PocketcamError::timeout("Stopping a recording", self.device_timeout),
                ))
            }
        }
        // The device has the stop; from here the monitor owns the way back to idle
        stopping.disarm();

        let task = self.recording.lock().take();
        let Some(RecordingTask { token, mut handle }) = task else {
            self.set_activity(CaptureActivity::Idle);
            return Err(PocketcamError::system("no recording monitor is running"));
        };

        match tokio::time::timeout(self.device_timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                self.set_activity(CaptureActivity::Idle);
                Err(PocketcamError::system(format!("recording monitor failed: {}", e)))
            }
            Err(_) => {
                warn!(
                    "Recording did not complete within {:?}; cancelling monitor",
                    self.device_timeout
                );
                token.cancel();
                if let Err(e) = handle.await {
                    warn!("Recording monitor ended abnormally: {}", e);
                }
                Err(report_failure(
                    &self.event_bus,
                    PocketcamError::timeout("Finishing a recording", self.device_timeout),
                ))
            }
        }
    }

    fn set_activity(&self, activity: CaptureActivity) {
        self.state.lock().activity = activity;
    }
}

/// Puts `activity` back to `restore` when dropped, unless disarmed or the
/// activity has already moved on. Covers error returns and abandoned futures.
struct ActivityGuard<'a> {
    state: &'a Mutex<ControllerState>,
    expected: CaptureActivity,
    restore: CaptureActivity,
    armed: bool,
}

impl<'a> ActivityGuard<'a> {
    fn new(
        state: &'a Mutex<ControllerState>,
        expected: CaptureActivity,
        restore: CaptureActivity,
    ) -> Self {
        Self {
            state,
            expected,
            restore,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.activity == self.expected {
            debug!("Activity {:?} -> {:?}", self.expected, self.restore);
            state.activity = self.restore;
        }
    }
}

struct RecordingMonitor {
    state: Arc<Mutex<ControllerState>>,
    staging: Arc<MediaStagingStore>,
    event_bus: Arc<EventBus>,
    file_prefix: String,
}

impl RecordingMonitor {
    async fn run(
        self,
        receiver: oneshot::Receiver<RecordingOutcome>,
        token: CancellationToken,
    ) -> Result<StagedMedia> {
        let outcome = tokio::select! {
            _ = token.cancelled() => {
                warn!("Recording monitor cancelled before the device finished");
                self.finish(false);
                return Err(PocketcamError::system("recording cancelled during teardown"));
            }
            outcome = receiver => outcome.unwrap_or_else(|_| RecordingOutcome::Failed {
                details: "capture device dropped the recording".to_string(),
                partial: None,
            }),
        };

        match outcome {
            RecordingOutcome::Finished { path } => {
                let media = StagedMedia {
                    temporary_path: path,
                    suggested_name: capture_file_name(&self.file_prefix, MediaKind::Video, Utc::now()),
                    kind: MediaKind::Video,
                };
                let staged = stage_capture(&self.staging, media).await;
                self.finish(staged.is_ok());
                staged
            }
            RecordingOutcome::Failed { details, partial } => {
                if let Some(partial) = partial {
                    self.staging.cleanup_artifact(&partial).await;
                }
                let error =
                    report_failure(&self.event_bus, PocketcamError::capture_failure(details));
                self.finish(false);
                Err(error)
            }
        }
    }

    fn finish(&self, succeeded: bool) {
        self.state.lock().activity = CaptureActivity::Idle;
        info!("Recording finished (succeeded: {})", succeeded);
        self.event_bus.emit(MediaEvent::RecordingFinished {
            succeeded,
            timestamp: SystemTime::now(),
        });
    }
}

async fn stage_capture(staging: &MediaStagingStore, media: StagedMedia) -> Result<StagedMedia> {
    match staging.stage(media.clone()) {
        Ok(()) => Ok(media),
        Err(e) => {
            staging.cleanup_artifact(&media.temporary_path).await;
            Err(e)
        }
    }
}

fn report_failure(event_bus: &EventBus, error: PocketcamError) -> PocketcamError {
    error!("Capture failed: {}", error);
    event_bus.emit(MediaEvent::CaptureFailed {
        details: error.to_string(),
    });
    let (title, message) = error.notice();
    event_bus.emit(MediaEvent::notice(title, message));
    error
}
