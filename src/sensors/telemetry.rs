use super::classifier::{
    orientation_category, speed_category, OrientationCategory, SpeedCategory, TelemetrySample,
};
use crate::config::SensorConfig;
use crate::error::{PocketcamError, Result};
use crate::events::{EventBus, MediaEvent};
use crate::permissions::{PermissionDomain, PermissionGate};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A single reading from the location or motion driver
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryReading {
    Location {
        altitude: Option<f64>,
        longitude: f64,
        latitude: f64,
        speed: Option<f64>,
    },
    Motion {
        x: f64,
        y: f64,
        z: f64,
    },
    /// Driver-reported problem; the stream stays open
    Error { details: String },
}

/// Watch parameters handed to the telemetry source
#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    pub location_interval: Duration,
    pub motion_interval: Duration,
    pub high_accuracy: bool,
}

impl From<&SensorConfig> for TelemetryOptions {
    fn from(config: &SensorConfig) -> Self {
        Self {
            location_interval: Duration::from_millis(config.location_interval_ms),
            motion_interval: Duration::from_millis(config.motion_interval_ms),
            high_accuracy: config.high_accuracy,
        }
    }
}

/// Raw GPS/accelerometer driver. Dropping the returned receiver clears the watch.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn subscribe(&self, options: &TelemetryOptions)
        -> Result<mpsc::Receiver<TelemetryReading>>;
}

/// Keeps the last-known telemetry sample for a permission-gated subscription
pub struct TelemetryMonitor {
    gate: Arc<PermissionGate>,
    event_bus: Arc<EventBus>,
    options: TelemetryOptions,
    latest: Arc<RwLock<TelemetrySample>>,
}

impl TelemetryMonitor {
    pub fn new(gate: Arc<PermissionGate>, event_bus: Arc<EventBus>, options: TelemetryOptions) -> Self {
        Self {
            gate,
            event_bus,
            options,
            latest: Arc::new(RwLock::new(TelemetrySample::default())),
        }
    }

    /// Start watching the source. Requires the location+motion permission.
    pub async fn start(&self, source: Arc<dyn TelemetrySource>) -> Result<TelemetrySubscription> {
        self.gate.require(PermissionDomain::LocationMotion)?;

        let mut readings = source.subscribe(&self.options).await?;
        let token = CancellationToken::new();
        let task_token = token.clone();
        let latest = Arc::clone(&self.latest);
        let event_bus = Arc::clone(&self.event_bus);

        info!(
            "Starting telemetry watch (location every {:?}, motion every {:?})",
            self.options.location_interval, self.options.motion_interval
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Telemetry watch cancelled");
                        break;
                    }
                    reading = readings.recv() => {
                        match reading {
                            Some(reading) => {
                                if apply_reading(&latest, reading) {
                                    event_bus.emit(MediaEvent::TelemetryUpdated {
                                        timestamp: SystemTime::now(),
                                    });
                                }
                            }
                            None => {
                                debug!("Telemetry source closed");
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(TelemetrySubscription {
            token,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn latest(&self) -> TelemetrySample {
        *self.latest.read()
    }

    pub fn speed_category(&self) -> SpeedCategory {
        speed_category(&self.latest())
    }

    pub fn orientation_category(&self) -> OrientationCategory {
        orientation_category(&self.latest())
    }
}

fn apply_reading(latest: &RwLock<TelemetrySample>, reading: TelemetryReading) -> bool {
    match reading {
        TelemetryReading::Location {
            altitude,
            longitude,
            latitude,
            speed,
        } => {
            let mut sample = latest.write();
            sample.altitude = altitude;
            sample.longitude = Some(longitude);
            sample.latitude = Some(latitude);
            sample.speed = speed;
            true
        }
        TelemetryReading::Motion { x, y, z } => {
            let mut sample = latest.write();
            sample.x = Some(x);
            sample.y = Some(y);
            sample.z = Some(z);
            true
        }
        TelemetryReading::Error { details } => {
            warn!("Telemetry source error: {}", details);
            false
        }
    }
}

/// Handle for a running telemetry watch; must be unsubscribed when its screen closes
pub struct TelemetrySubscription {
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetrySubscription {
    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop the watch and wait for the listener to exit
    pub async fn unsubscribe(self) {
        self.token.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Telemetry listener ended abnormally: {}", e);
            }
        }
        info!("Telemetry watch stopped");
    }
}

impl Drop for TelemetrySubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Telemetry source fed through a channel, for tests and replay
pub struct ChannelTelemetrySource {
    receiver: Mutex<Option<mpsc::Receiver<TelemetryReading>>>,
}

impl ChannelTelemetrySource {
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<TelemetryReading>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                receiver: Mutex::new(Some(receiver)),
            },
            sender,
        )
    }
}

#[async_trait]
impl TelemetrySource for ChannelTelemetrySource {
    async fn subscribe(
        &self,
        _options: &TelemetryOptions,
    ) -> Result<mpsc::Receiver<TelemetryReading>> {
        self.receiver
            .lock()
            .take()
            .ok_or_else(|| PocketcamError::system("Telemetry channel already subscribed"))
    }
}
