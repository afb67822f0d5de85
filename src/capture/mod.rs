mod controller;
mod device;
mod mock;
mod session;
#[cfg(test)]
mod tests;

pub use controller::{CaptureController, CaptureOutcome};
pub use device::{CaptureDevice, PhotoOptions, RecordingOptions, RecordingOutcome};
pub use mock::MockCaptureDevice;
pub use session::{capture_file_name, CameraFacing, CaptureActivity, CaptureMode, CaptureSession};
