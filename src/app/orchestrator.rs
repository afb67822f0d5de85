use super::builder::PocketcamAppBuilder;
use crate::capture::CaptureController;
use crate::catalog::{CatalogEntry, MediaCatalog, RenameRequest};
use crate::config::PocketcamConfig;
use crate::error::{PocketcamError, Result};
use crate::events::{EventBus, MediaEvent};
use crate::permissions::{PermissionDomain, PermissionGate, PermissionState};
use crate::sensors::{TelemetryMonitor, TelemetrySource, TelemetrySubscription};
use crate::staging::{MediaStagingStore, StagedMedia};
use crate::viewer::{PlaybackDevice, PlaybackEvent, ViewerNavigator, ViewerSession};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Wires the components together and applies the screen lifecycle rules
pub struct PocketcamApp {
    pub(super) config: PocketcamConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) gate: Arc<PermissionGate>,
    pub(super) catalog: Arc<MediaCatalog>,
    pub(super) staging: Arc<MediaStagingStore>,
    pub(super) capture: Arc<CaptureController>,
    pub(super) telemetry: Arc<TelemetryMonitor>,
    pub(super) telemetry_subscription: Mutex<Option<TelemetrySubscription>>,
}

impl PocketcamApp {
    pub fn builder() -> PocketcamAppBuilder {
        PocketcamAppBuilder::new()
    }

    pub fn config(&self) -> &PocketcamConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn permissions(&self) -> Arc<PermissionGate> {
        Arc::clone(&self.gate)
    }

    pub fn catalog(&self) -> Arc<MediaCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn staging(&self) -> Arc<MediaStagingStore> {
        Arc::clone(&self.staging)
    }

    pub fn capture(&self) -> Arc<CaptureController> {
        Arc::clone(&self.capture)
    }

    pub fn telemetry(&self) -> Arc<TelemetryMonitor> {
        Arc::clone(&self.telemetry)
    }

    /// Ask for camera access when the capture screen opens
    pub async fn enter_capture_screen(&self) -> Result<PermissionState> {
        self.gate.request(PermissionDomain::Capture).await
    }

    /// Stop any active recording before the capture screen goes away.
    /// A video finished during teardown stays staged for the user to resolve.
    pub async fn leave_capture_screen(&self) -> Result<Option<StagedMedia>> {
        self.capture.shutdown().await
    }

    /// Request location+motion access and start the watch once granted
    pub async fn start_telemetry(&self, source: Arc<dyn TelemetrySource>) -> Result<PermissionState> {
        let state = self.gate.request(PermissionDomain::LocationMotion).await?;
        if state != PermissionState::Granted {
            info!("Telemetry not started: permission is {:?}", state);
            return Ok(state);
        }

        let subscription = self.telemetry.start(source).await?;
        let previous = self.telemetry_subscription.lock().replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe().await;
        }
        Ok(state)
    }

    pub async fn stop_telemetry(&self) {
        let subscription = self.telemetry_subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
        }
    }

    pub async fn list_media(&self) -> Result<Vec<CatalogEntry>> {
        self.catalog.list().await.map_err(|e| self.notify(e))
    }

    /// Open the viewer on a fresh snapshot. An empty catalog never reaches the navigator.
    pub async fn open_viewer(
        &self,
        start_index: usize,
        device: Arc<dyn PlaybackDevice>,
        events: mpsc::Receiver<PlaybackEvent>,
    ) -> Result<ViewerSession> {
        let snapshot = self.list_media().await?;
        if snapshot.is_empty() {
            warn!("Refusing to open viewer on an empty catalog");
            return Err(PocketcamError::EmptyCatalog);
        }

        let navigator = ViewerNavigator::new(snapshot, start_index, self.config.viewer.seek_step())?;
        Ok(ViewerSession::open(navigator, device, events))
    }

    pub async fn commit_staged(&self, new_name: Option<&str>) -> Result<CatalogEntry> {
        self.staging.commit(new_name).await
    }

    pub async fn discard_staged(&self) -> Result<()> {
        self.staging.discard().await
    }

    pub async fn rename_entry(&self, request: &RenameRequest) -> Result<CatalogEntry> {
        self.catalog
            .apply_rename(request)
            .await
            .map_err(|e| self.notify(e))
    }

    pub async fn remove_entry(&self, path: &Path) -> Result<()> {
        self.catalog.remove(path).await.map_err(|e| self.notify(e))
    }

    /// Tear down every screen-owned resource
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down pocketcam");
        self.stop_telemetry().await;

        match self.leave_capture_screen().await {
            Ok(_) => {
                info!("Shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!("Error stopping capture: {}", e);
                Err(e)
            }
        }
    }

    fn notify(&self, error: PocketcamError) -> PocketcamError {
        let (title, message) = error.notice();
        self.event_bus.emit(MediaEvent::notice(title, message));
        error
    }
}
