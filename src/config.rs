use crate::capture::CameraFacing;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PocketcamConfig {
    pub capture: CaptureConfig,
    pub catalog: CatalogConfig,
    pub viewer: ViewerConfig,
    pub sensors: SensorConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Prefix for generated capture file names (`<prefix>_<timestamp>.jpg`)
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Quality prioritization passed to the capture device for photos
    #[serde(default = "default_photo_quality")]
    pub photo_quality: PhotoQuality,

    /// Camera facing selected when the capture screen opens
    #[serde(default = "default_facing")]
    pub default_facing: CameraFacing,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    /// Flat directory holding committed media
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ViewerConfig {
    /// Seconds skipped by a single seek forward/backward
    #[serde(default = "default_seek_step_seconds")]
    pub seek_step_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SensorConfig {
    /// Location watch interval in milliseconds
    #[serde(default = "default_location_interval_ms")]
    pub location_interval_ms: u64,

    /// Accelerometer update interval in milliseconds
    #[serde(default = "default_motion_interval_ms")]
    pub motion_interval_ms: u64,

    /// Request high accuracy location fixes
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Upper bound for take-photo/start/stop recording calls
    #[serde(default = "default_device_timeout_seconds")]
    pub device_timeout_seconds: u64,

    /// Upper bound for a permission request round-trip
    #[serde(default = "default_permission_timeout_seconds")]
    pub permission_timeout_seconds: u64,

    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PhotoQuality {
    Speed,
    Balanced,
    Quality,
}

impl SystemConfig {
    pub fn device_timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout_seconds)
    }

    pub fn permission_timeout(&self) -> Duration {
        Duration::from_secs(self.permission_timeout_seconds)
    }
}

impl ViewerConfig {
    pub fn seek_step(&self) -> Duration {
        Duration::from_secs(self.seek_step_seconds)
    }
}

impl PocketcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("pocketcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("capture.file_prefix", default_file_prefix())?
            .set_default("capture.photo_quality", "speed")?
            .set_default("capture.default_facing", "back")?
            .set_default("catalog.path", default_catalog_path())?
            .set_default("viewer.seek_step_seconds", default_seek_step_seconds())?
            .set_default(
                "sensors.location_interval_ms",
                default_location_interval_ms(),
            )?
            .set_default("sensors.motion_interval_ms", default_motion_interval_ms())?
            .set_default("sensors.high_accuracy", default_high_accuracy())?
            .set_default(
                "system.device_timeout_seconds",
                default_device_timeout_seconds(),
            )?
            .set_default(
                "system.permission_timeout_seconds",
                default_permission_timeout_seconds(),
            )?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with POCKETCAM_ prefix
            .add_source(Environment::with_prefix("POCKETCAM").separator("__"))
            .build()?;

        let config: PocketcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.file_prefix.is_empty() {
            return Err(ConfigError::Message(
                "Capture file_prefix cannot be empty".to_string(),
            ));
        }

        if self.capture.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Message(
                "Capture file_prefix cannot contain path separators".to_string(),
            ));
        }

        if self.catalog.path.is_empty() {
            return Err(ConfigError::Message(
                "Catalog path cannot be empty".to_string(),
            ));
        }

        if self.viewer.seek_step_seconds == 0 {
            return Err(ConfigError::Message(
                "Viewer seek_step_seconds must be greater than 0".to_string(),
            ));
        }

        if self.sensors.location_interval_ms == 0 || self.sensors.motion_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Sensor intervals must be greater than 0".to_string(),
            ));
        }

        if self.system.device_timeout_seconds == 0
            || self.system.permission_timeout_seconds == 0
        {
            return Err(ConfigError::Message(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for PocketcamConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                file_prefix: default_file_prefix(),
                photo_quality: default_photo_quality(),
                default_facing: default_facing(),
            },
            catalog: CatalogConfig {
                path: default_catalog_path(),
            },
            viewer: ViewerConfig {
                seek_step_seconds: default_seek_step_seconds(),
            },
            sensors: SensorConfig {
                location_interval_ms: default_location_interval_ms(),
                motion_interval_ms: default_motion_interval_ms(),
                high_accuracy: default_high_accuracy(),
            },
            system: SystemConfig {
                device_timeout_seconds: default_device_timeout_seconds(),
                permission_timeout_seconds: default_permission_timeout_seconds(),
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_file_prefix() -> String {
    "capture".to_string()
}
fn default_photo_quality() -> PhotoQuality {
    PhotoQuality::Speed
}
fn default_facing() -> CameraFacing {
    CameraFacing::Back
}

fn default_catalog_path() -> String {
    "./media".to_string()
}

fn default_seek_step_seconds() -> u64 {
    5
}

fn default_location_interval_ms() -> u64 {
    10_000
}
fn default_motion_interval_ms() -> u64 {
    500
}
fn default_high_accuracy() -> bool {
    true
}

fn default_device_timeout_seconds() -> u64 {
    30
}
fn default_permission_timeout_seconds() -> u64 {
    60
}
fn default_event_bus_capacity() -> usize {
    100
}
