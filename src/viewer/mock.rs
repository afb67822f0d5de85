use super::transport::{PlaybackDevice, PlaybackEvent};
use crate::error::{PocketcamError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Mock playback device that records commands and lets tests emit decoder callbacks
pub struct MockPlaybackDevice {
    events: mpsc::Sender<PlaybackEvent>,
    seeks: Mutex<Vec<(PathBuf, Duration)>>,
    pauses: Mutex<Vec<(PathBuf, bool)>>,
}

impl MockPlaybackDevice {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PlaybackEvent>) {
        let (events, receiver) = mpsc::channel(capacity);
        let device = Self {
            events,
            seeks: Mutex::new(Vec::new()),
            pauses: Mutex::new(Vec::new()),
        };
        (device, receiver)
    }

    pub async fn report_loaded(&self, path: &Path, duration: Duration) -> Result<()> {
        self.send(PlaybackEvent::Loaded {
            path: path.to_path_buf(),
            duration,
        })
        .await
    }

    pub async fn report_progress(&self, path: &Path, current_time: Duration) -> Result<()> {
        self.send(PlaybackEvent::Progress {
            path: path.to_path_buf(),
            current_time,
        })
        .await
    }

    pub fn seeks(&self) -> Vec<(PathBuf, Duration)> {
        self.seeks.lock().clone()
    }

    pub fn pauses(&self) -> Vec<(PathBuf, bool)> {
        self.pauses.lock().clone()
    }

    async fn send(&self, event: PlaybackEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| PocketcamError::system("playback listener is gone"))
    }
}

#[async_trait]
impl PlaybackDevice for MockPlaybackDevice {
    async fn seek(&self, path: &Path, time: Duration) -> Result<()> {
        self.seeks.lock().push((path.to_path_buf(), time));
        Ok(())
    }

    async fn set_paused(&self, path: &Path, paused: bool) -> Result<()> {
        self.pauses.lock().push((path.to_path_buf(), paused));
        Ok(())
    }
}
