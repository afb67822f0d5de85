use super::transport::{PlaybackEvent, TransportState};
use crate::catalog::CatalogEntry;
use crate::error::{PocketcamError, Result};
use std::time::Duration;
use tracing::debug;

/// Cyclic pager over a fixed catalog snapshot with transport state for video entries
#[derive(Debug, Clone)]
pub struct ViewerNavigator {
    snapshot: Vec<CatalogEntry>,
    index: usize,
    transport: Option<TransportState>,
    seek_step: Duration,
}

impl ViewerNavigator {
    pub fn new(snapshot: Vec<CatalogEntry>, start_index: usize, seek_step: Duration) -> Result<Self> {
        if snapshot.is_empty() {
            return Err(PocketcamError::EmptyCatalog);
        }
        if start_index >= snapshot.len() {
            return Err(PocketcamError::IndexOutOfRange {
                index: start_index,
                len: snapshot.len(),
            });
        }

        let transport = transport_for(&snapshot[start_index]);
        Ok(Self {
            snapshot,
            index: start_index,
            transport,
            seek_step,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn snapshot(&self) -> &[CatalogEntry] {
        &self.snapshot
    }

    pub fn current(&self) -> &CatalogEntry {
        &self.snapshot[self.index]
    }

    /// `None` while an image is shown
    pub fn transport(&self) -> Option<TransportState> {
        self.transport
    }

    pub fn seek_step(&self) -> Duration {
        self.seek_step
    }

    pub fn next(&mut self) -> &CatalogEntry {
        self.select((self.index + 1) % self.snapshot.len())
    }

    pub fn previous(&mut self) -> &CatalogEntry {
        let len = self.snapshot.len();
        self.select((self.index + len - 1) % len)
    }

    /// Flip paused and return the new value
    pub fn toggle_play_pause(&mut self) -> Result<bool> {
        let transport = self.transport_mut()?;
        transport.paused = !transport.paused;
        Ok(transport.paused)
    }

    /// Seek target for moving forward; position itself follows device progress
    pub fn seek_forward(&self, delta: Duration) -> Result<Duration> {
        Ok(self.video_transport()?.forward_target(delta))
    }

    pub fn seek_backward(&self, delta: Duration) -> Result<Duration> {
        Ok(self.video_transport()?.backward_target(delta))
    }

    /// Apply a decoder callback. Events for another entry or for an image are ignored.
    pub fn handle_playback_event(&mut self, event: &PlaybackEvent) -> bool {
        if event.path() != self.current().path.as_path() {
            debug!("Ignoring playback event for {}", event.path().display());
            return false;
        }
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };

        match event {
            PlaybackEvent::Loaded { duration, .. } => {
                transport.duration = *duration;
                transport.current_time = transport.current_time.min(*duration);
            }
            PlaybackEvent::Progress { current_time, .. } => {
                transport.current_time = (*current_time).min(transport.duration);
            }
        }
        true
    }

    fn select(&mut self, index: usize) -> &CatalogEntry {
        self.index = index;
        self.transport = transport_for(&self.snapshot[index]);
        debug!("Viewer at {}/{}", index + 1, self.snapshot.len());
        &self.snapshot[index]
    }

    fn video_transport(&self) -> Result<&TransportState> {
        self.transport.as_ref().ok_or_else(|| PocketcamError::NotVideo {
            name: self.current().display_name.clone(),
        })
    }

    fn transport_mut(&mut self) -> Result<&mut TransportState> {
        let name = self.current().display_name.clone();
        self.transport
            .as_mut()
            .ok_or(PocketcamError::NotVideo { name })
    }
}

/// The player only decodes `.mp4`; every other entry, `.mov` included, is shown as an image
pub fn plays_as_video(entry: &CatalogEntry) -> bool {
    entry.display_name.ends_with(".mp4")
}

fn transport_for(entry: &CatalogEntry) -> Option<TransportState> {
    plays_as_video(entry).then(TransportState::initial)
}
