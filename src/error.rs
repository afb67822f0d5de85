use crate::permissions::PermissionDomain;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PocketcamError {
    #[error("Permission denied for {domain}")]
    PermissionDenied { domain: PermissionDomain },

    #[error("Capture device unavailable")]
    DeviceUnavailable,

    #[error("Capture failed: {details}")]
    CaptureFailure { details: String },

    #[error("Filesystem error during {operation} on {path}: {details}")]
    FileSystem {
        operation: String,
        path: String,
        details: String,
    },

    #[error("A staged capture is already pending; commit or discard it first")]
    StagingOccupied,

    #[error("No staged capture to resolve")]
    NoStagedMedia,

    #[error("Staged capture is already being committed or discarded")]
    StagingBusy,

    #[error("A photo capture is already in progress")]
    CaptureBusy,

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{name} is not a video")]
    NotVideo { name: String },

    #[error("Destination already exists: {path}")]
    NameCollision { path: String },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Receiver lagged behind by {skipped} events")]
    Lagged { skipped: u64 },

    #[error("Event channel closed")]
    ChannelClosed,
}

impl PocketcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn capture_failure<S: Into<String>>(details: S) -> Self {
        Self::CaptureFailure {
            details: details.into(),
        }
    }

    pub fn filesystem(
        operation: &str,
        path: &std::path::Path,
        error: impl std::fmt::Display,
    ) -> Self {
        Self::FileSystem {
            operation: operation.to_string(),
            path: path.display().to_string(),
            details: error.to_string(),
        }
    }

    pub fn timeout(operation: &str, limit: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }
    }

    /// Whether the caller can retry after resolving the cause.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PocketcamError::PermissionDenied { .. }
                | PocketcamError::DeviceUnavailable
                | PocketcamError::CaptureFailure { .. }
                | PocketcamError::FileSystem { .. }
                | PocketcamError::StagingOccupied
                | PocketcamError::StagingBusy
                | PocketcamError::CaptureBusy
                | PocketcamError::NameCollision { .. }
                | PocketcamError::InvalidName { .. }
                | PocketcamError::Timeout { .. }
        )
    }

    /// Title and body of the notice shown to the user for this error.
    pub fn notice(&self) -> (String, String) {
        match self {
            PocketcamError::PermissionDenied { domain } => (
                "Permission Denied".to_string(),
                domain.denial_message().to_string(),
            ),
            PocketcamError::DeviceUnavailable => (
                "Camera Unavailable".to_string(),
                "No capture device is available.".to_string(),
            ),
            PocketcamError::CaptureFailure { details } => {
                ("Capture Failed".to_string(), details.clone())
            }
            PocketcamError::FileSystem {
                operation, path, ..
            } => (
                "Storage Error".to_string(),
                format!("Could not {} {}", operation, path),
            ),
            PocketcamError::NameCollision { path } => (
                "Name Taken".to_string(),
                format!("A file named {} already exists", path),
            ),
            PocketcamError::Timeout { operation, seconds } => (
                "Timed Out".to_string(),
                format!("{} did not respond within {}s", operation, seconds),
            ),
            other => ("Error".to_string(), other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PocketcamError>;
