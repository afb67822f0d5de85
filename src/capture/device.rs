use super::session::CameraFacing;
use crate::config::PhotoQuality;
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoOptions {
    pub quality: PhotoQuality,
    pub facing: CameraFacing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingOptions {
    pub facing: CameraFacing,
}

/// Terminal result of a recording, delivered exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingOutcome {
    Finished { path: PathBuf },
    Failed {
        details: String,
        /// Partially written file the device left behind, if any
        partial: Option<PathBuf>,
    },
}

/// Platform camera. Files it returns live in scratch space owned by the caller afterwards.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    fn is_available(&self) -> bool;

    async fn take_photo(&self, options: &PhotoOptions) -> Result<PathBuf>;

    /// Begin recording. The receiver resolves when the recording ends for any reason.
    async fn start_recording(
        &self,
        options: &RecordingOptions,
    ) -> Result<oneshot::Receiver<RecordingOutcome>>;

    /// Ask the device to finish the active recording
    async fn stop_recording(&self) -> Result<()>;
}
