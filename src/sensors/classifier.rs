use serde::{Deserialize, Serialize};

/// Last-known location and accelerometer values; absent until first reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub altitude: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub speed: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl TelemetrySample {
    pub fn with_speed(speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    pub fn with_acceleration(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedCategory {
    Vehicle,
    Walking,
    Stationary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationCategory {
    LandscapeLeft,
    LandscapeRight,
    PortraitUp,
    PortraitDown,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Above(f64),
    Below(f64),
}

/// Checked top to bottom; a speed strictly above the threshold selects the category
const SPEED_THRESHOLDS: &[(f64, SpeedCategory)] = &[
    (30.0, SpeedCategory::Vehicle),
    (5.0, SpeedCategory::Walking),
];

/// Checked top to bottom, x before y; first satisfied rule wins
const ORIENTATION_RULES: &[(Axis, Bound, OrientationCategory)] = &[
    (Axis::X, Bound::Above(7.0), OrientationCategory::LandscapeLeft),
    (Axis::X, Bound::Below(-7.0), OrientationCategory::LandscapeRight),
    (Axis::Y, Bound::Above(7.0), OrientationCategory::PortraitUp),
    (Axis::Y, Bound::Below(-7.0), OrientationCategory::PortraitDown),
];

/// Classify movement speed; a missing speed counts as zero
pub fn speed_category(sample: &TelemetrySample) -> SpeedCategory {
    let speed = sample.speed.unwrap_or(0.0);

    SPEED_THRESHOLDS
        .iter()
        .find(|(threshold, _)| speed > *threshold)
        .map(|(_, category)| *category)
        .unwrap_or(SpeedCategory::Stationary)
}

/// Classify device orientation from the accelerometer x/y axes
pub fn orientation_category(sample: &TelemetrySample) -> OrientationCategory {
    ORIENTATION_RULES
        .iter()
        .find(|(axis, bound, _)| {
            let value = match axis {
                Axis::X => sample.x,
                Axis::Y => sample.y,
            };

            match (value, bound) {
                (Some(v), Bound::Above(limit)) => v > *limit,
                (Some(v), Bound::Below(limit)) => v < *limit,
                (None, _) => false,
            }
        })
        .map(|(_, _, category)| *category)
        .unwrap_or(OrientationCategory::Unknown)
}

impl SpeedCategory {
    /// Bundled icon shown for this category
    pub fn asset(&self) -> &'static str {
        match self {
            SpeedCategory::Vehicle => "car.png",
            SpeedCategory::Walking => "walking.png",
            SpeedCategory::Stationary => "sitting.png",
        }
    }
}

impl OrientationCategory {
    /// Bundled icon shown for this category
    pub fn asset(&self) -> &'static str {
        match self {
            OrientationCategory::LandscapeLeft => "landscape-left.png",
            OrientationCategory::LandscapeRight => "landscape-right.png",
            OrientationCategory::PortraitUp => "portrait-up.png",
            OrientationCategory::PortraitDown => "portrait-down.png",
            OrientationCategory::Unknown => "unknown.png",
        }
    }
}
