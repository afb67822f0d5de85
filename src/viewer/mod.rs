mod mock;
mod navigator;
mod session;
mod transport;

pub use mock::MockPlaybackDevice;
pub use navigator::{plays_as_video, ViewerNavigator};
pub use session::ViewerSession;
pub use transport::{PlaybackDevice, PlaybackEvent, TransportState};
