use crate::catalog::MediaKind;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Photo,
    Video,
}

impl CaptureMode {
    pub fn toggled(self) -> Self {
        match self {
            CaptureMode::Photo => CaptureMode::Video,
            CaptureMode::Video => CaptureMode::Photo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Back,
    Front,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }
}

/// What the capture device is busy with right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureActivity {
    Idle,
    TakingPhoto,
    Recording,
    /// A stop request is with the device; the recording may still resume if it refuses
    Stopping,
}

/// Observable state of the capture screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    pub mode: CaptureMode,
    pub facing: CameraFacing,
    pub recording: bool,
}

/// `<prefix>_<ISO-8601 UTC with milliseconds>.<ext>`
pub fn capture_file_name(prefix: &str, kind: MediaKind, timestamp: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        kind.extension()
    )
}
