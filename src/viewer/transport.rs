use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Playback position of the video currently on screen. `current_time <= duration` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportState {
    pub paused: bool,
    pub current_time: Duration,
    pub duration: Duration,
}

impl TransportState {
    /// Paused at zero until the playback device reports a load
    pub fn initial() -> Self {
        Self {
            paused: true,
            current_time: Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    pub fn forward_target(&self, delta: Duration) -> Duration {
        self.current_time.saturating_add(delta).min(self.duration)
    }

    pub fn backward_target(&self, delta: Duration) -> Duration {
        self.current_time.saturating_sub(delta)
    }
}

/// Callbacks from the video decoder, tagged with the file they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Progress { path: PathBuf, current_time: Duration },
    Loaded { path: PathBuf, duration: Duration },
}

impl PlaybackEvent {
    pub fn path(&self) -> &Path {
        match self {
            PlaybackEvent::Progress { path, .. } | PlaybackEvent::Loaded { path, .. } => path,
        }
    }
}

/// Native video decoder
#[async_trait]
pub trait PlaybackDevice: Send + Sync {
    async fn seek(&self, path: &Path, time: Duration) -> Result<()>;

    async fn set_paused(&self, path: &Path, paused: bool) -> Result<()>;
}
