use crate::catalog::{CatalogEntry, MediaCatalog, MediaKind};
use crate::error::{PocketcamError, Result};
use crate::events::{EventBus, MediaEvent};
use crate::storage::Filesystem;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A captured file that has not been committed to or discarded from the catalog yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedMedia {
    pub temporary_path: PathBuf,
    pub suggested_name: String,
    pub kind: MediaKind,
}

#[derive(Debug)]
enum Slot {
    Empty,
    Pending(StagedMedia),
    /// A commit or discard is in flight for this artifact
    Resolving(StagedMedia),
}

/// Owns the single staged artifact and resolves it into the catalog or the bin
pub struct MediaStagingStore {
    slot: Mutex<Slot>,
    filesystem: Arc<dyn Filesystem>,
    catalog: Arc<MediaCatalog>,
    event_bus: Arc<EventBus>,
}

impl MediaStagingStore {
    pub fn new(
        filesystem: Arc<dyn Filesystem>,
        catalog: Arc<MediaCatalog>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
            filesystem,
            catalog,
            event_bus,
        }
    }

    /// Place a fresh capture in the slot; refused while another is unresolved
    pub fn stage(&self, media: StagedMedia) -> Result<()> {
        let mut slot = self.slot.lock();
        if !matches!(*slot, Slot::Empty) {
            debug!("Refusing to stage {}: slot occupied", media.suggested_name);
            return Err(PocketcamError::StagingOccupied);
        }

        info!(
            "Staged {:?} {} at {}",
            media.kind,
            media.suggested_name,
            media.temporary_path.display()
        );
        self.event_bus.emit(MediaEvent::CaptureStaged {
            suggested_name: media.suggested_name.clone(),
            kind: media.kind,
        });
        *slot = Slot::Pending(media);
        Ok(())
    }

    /// The unresolved artifact, if any
    pub fn pending(&self) -> Option<StagedMedia> {
        match &*self.slot.lock() {
            Slot::Empty => None,
            Slot::Pending(media) | Slot::Resolving(media) => Some(media.clone()),
        }
    }

    pub fn is_occupied(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::Empty)
    }

    /// Move the staged file into the catalog under its suggested name or `new_name`.
    /// On failure the artifact stays pending so the caller can retry or discard.
    pub async fn commit(&self, new_name: Option<&str>) -> Result<CatalogEntry> {
        let (media, resolution) = self.begin_resolution()?;
        let name = commit_name(&media, new_name);

        match self.catalog.import(&media.temporary_path, &name).await {
            Ok(entry) => {
                resolution.finish();
                info!("Committed {} to catalog", entry.path.display());
                self.event_bus.emit(MediaEvent::MediaCommitted {
                    path: entry.path.clone(),
                });
                self.event_bus.emit(MediaEvent::notice(
                    "Media saved!",
                    "The media has been saved successfully.",
                ));
                Ok(entry)
            }
            Err(e) => {
                error!("Commit of {} failed: {}", media.suggested_name, e);
                drop(resolution);
                let (title, message) = e.notice();
                self.event_bus.emit(MediaEvent::notice(title, message));
                Err(e)
            }
        }
    }

    /// Delete the staged file. The slot is cleared even when deletion fails.
    pub async fn discard(&self) -> Result<()> {
        let (media, resolution) = self.begin_resolution()?;
        let outcome = self.delete_temporary(&media.temporary_path).await;
        resolution.finish();

        self.event_bus.emit(MediaEvent::MediaDiscarded {
            temporary_path: media.temporary_path.clone(),
        });

        match outcome {
            Ok(()) => {
                info!("Discarded {}", media.suggested_name);
                Ok(())
            }
            Err(e) => {
                // Known trade-off: the temp file may be left behind
                warn!(
                    "Discarded {} but could not delete {}: {}",
                    media.suggested_name,
                    media.temporary_path.display(),
                    e
                );
                Err(PocketcamError::filesystem("delete", &media.temporary_path, e))
            }
        }
    }

    /// Best-effort removal of an artifact that never reached the slot
    pub async fn cleanup_artifact(&self, path: &Path) {
        if let Err(e) = self.delete_temporary(path).await {
            warn!("Failed to clean up partial artifact {}: {}", path.display(), e);
        }
    }

    fn begin_resolution(&self) -> Result<(StagedMedia, Resolution<'_>)> {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Empty) {
            Slot::Empty => Err(PocketcamError::NoStagedMedia),
            Slot::Resolving(media) => {
                *slot = Slot::Resolving(media);
                Err(PocketcamError::StagingBusy)
            }
            Slot::Pending(media) => {
                *slot = Slot::Resolving(media.clone());
                Ok((
                    media,
                    Resolution {
                        slot: &self.slot,
                        settled: false,
                    },
                ))
            }
        }
    }

    async fn delete_temporary(&self, path: &Path) -> io::Result<()> {
        match self.filesystem.remove_file(path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Temporary file {} already gone", path.display());
                Ok(())
            }
            other => other,
        }
    }
}

/// An in-flight commit or discard. Unless settled with `finish`, dropping it
/// (failure, or the caller abandoning the future) puts the artifact back to pending.
struct Resolution<'a> {
    slot: &'a Mutex<Slot>,
    settled: bool,
}

impl Resolution<'_> {
    fn finish(mut self) {
        *self.slot.lock() = Slot::Empty;
        self.settled = true;
    }
}

impl Drop for Resolution<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut slot = self.slot.lock();
        if let Slot::Resolving(media) = std::mem::replace(&mut *slot, Slot::Empty) {
            debug!("{} is pending again", media.suggested_name);
            *slot = Slot::Pending(media);
        }
    }
}

/// Final file name for a commit; a caller-supplied name keeps the staged kind's extension
fn commit_name(media: &StagedMedia, new_name: Option<&str>) -> String {
    match new_name.map(str::trim).filter(|name| !name.is_empty()) {
        None => media.suggested_name.clone(),
        Some(name) if MediaKind::from_file_name(name) == Some(media.kind) => name.to_string(),
        Some(name) => format!("{}.{}", name, media.kind.extension()),
    }
}
