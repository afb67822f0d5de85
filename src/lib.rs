pub mod app;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod permissions;
pub mod sensors;
pub mod staging;
pub mod storage;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{PocketcamApp, PocketcamAppBuilder};
pub use capture::{
    CameraFacing, CaptureController, CaptureDevice, CaptureMode, CaptureOutcome, CaptureSession,
    MockCaptureDevice,
};
pub use catalog::{CatalogEntry, MediaCatalog, MediaKind, RenameRequest};
pub use config::PocketcamConfig;
pub use error::{PocketcamError, Result};
pub use events::{EventBus, EventFilter, EventReceiver, MediaEvent};
pub use permissions::{PermissionDomain, PermissionGate, PermissionProvider, PermissionState};
pub use sensors::{
    orientation_category, speed_category, OrientationCategory, SpeedCategory, TelemetryMonitor,
    TelemetrySample, TelemetrySource,
};
pub use staging::{MediaStagingStore, StagedMedia};
pub use storage::{Filesystem, LocalFilesystem};
pub use viewer::{PlaybackDevice, PlaybackEvent, TransportState, ViewerNavigator, ViewerSession};
