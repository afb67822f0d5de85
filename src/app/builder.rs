use super::PocketcamApp;
use crate::capture::{CaptureController, CaptureDevice};
use crate::catalog::MediaCatalog;
use crate::config::PocketcamConfig;
use crate::error::{PocketcamError, Result};
use crate::events::EventBus;
use crate::permissions::{PermissionGate, PermissionProvider};
use crate::sensors::{TelemetryMonitor, TelemetryOptions};
use crate::staging::MediaStagingStore;
use crate::storage::{Filesystem, LocalFilesystem};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Builder for PocketcamApp
pub struct PocketcamAppBuilder {
    config: Option<PocketcamConfig>,
    capture_device: Option<Arc<dyn CaptureDevice>>,
    permission_provider: Option<Arc<dyn PermissionProvider>>,
    filesystem: Option<Arc<dyn Filesystem>>,
    event_bus: Option<Arc<EventBus>>,
}

impl PocketcamAppBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            capture_device: None,
            permission_provider: None,
            filesystem: None,
            event_bus: None,
        }
    }

    pub fn with_config(mut self, config: PocketcamConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_capture_device(mut self, device: Arc<dyn CaptureDevice>) -> Self {
        self.capture_device = Some(device);
        self
    }

    pub fn with_permission_provider(mut self, provider: Arc<dyn PermissionProvider>) -> Self {
        self.permission_provider = Some(provider);
        self
    }

    /// Defaults to the local filesystem
    pub fn with_filesystem(mut self, filesystem: Arc<dyn Filesystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Defaults to a bus sized by `system.event_bus_capacity`
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<PocketcamApp> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let capture_device = self
            .capture_device
            .ok_or_else(|| PocketcamError::system("A capture device is required"))?;
        let permission_provider = self
            .permission_provider
            .ok_or_else(|| PocketcamError::system("A permission provider is required"))?;
        let filesystem = self
            .filesystem
            .unwrap_or_else(|| Arc::new(LocalFilesystem::new()));
        let event_bus = self
            .event_bus
            .unwrap_or_else(|| Arc::new(EventBus::new(config.system.event_bus_capacity)));

        let gate = Arc::new(PermissionGate::new(
            permission_provider,
            Arc::clone(&event_bus),
            config.system.permission_timeout(),
        ));
        let catalog = Arc::new(MediaCatalog::new(
            &config.catalog.path,
            Arc::clone(&filesystem),
            Arc::clone(&event_bus),
        ));
        let staging = Arc::new(MediaStagingStore::new(
            filesystem,
            Arc::clone(&catalog),
            Arc::clone(&event_bus),
        ));
        let capture = Arc::new(CaptureController::new(
            config.capture.clone(),
            config.system.device_timeout(),
            capture_device,
            Arc::clone(&gate),
            Arc::clone(&staging),
            Arc::clone(&event_bus),
        ));
        let telemetry = Arc::new(TelemetryMonitor::new(
            Arc::clone(&gate),
            Arc::clone(&event_bus),
            TelemetryOptions::from(&config.sensors),
        ));

        info!("Pocketcam components wired (catalog at {})", config.catalog.path);

        Ok(PocketcamApp {
            config,
            event_bus,
            gate,
            catalog,
            staging,
            capture,
            telemetry,
            telemetry_subscription: Mutex::new(None),
        })
    }
}

impl Default for PocketcamAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
