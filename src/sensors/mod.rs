mod classifier;
mod telemetry;

pub use classifier::{
    orientation_category, speed_category, OrientationCategory, SpeedCategory, TelemetrySample,
};
pub use telemetry::{
    ChannelTelemetrySource, TelemetryMonitor, TelemetryOptions, TelemetryReading,
    TelemetrySource, TelemetrySubscription,
};
