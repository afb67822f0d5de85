use super::entry::CatalogEntry;
use super::rename::{validate_file_name, RenameRequest};
use crate::error::{PocketcamError, Result};
use crate::events::{EventBus, MediaEvent};
use crate::storage::Filesystem;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Directory-backed media catalog. The directory listing is the catalog; there is
/// no index file and no change notification, callers re-`list()` after mutating.
pub struct MediaCatalog {
    dir: PathBuf,
    filesystem: Arc<dyn Filesystem>,
    event_bus: Arc<EventBus>,
}

impl MediaCatalog {
    pub fn new<P: Into<PathBuf>>(
        dir: P,
        filesystem: Arc<dyn Filesystem>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            dir: dir.into(),
            filesystem,
            event_bus,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the catalog directory if it does not exist yet
    pub async fn ensure_directory(&self) -> Result<()> {
        if !self
            .filesystem
            .exists(&self.dir)
            .await
            .map_err(|e| PocketcamError::filesystem("inspect", &self.dir, e))?
        {
            self.filesystem
                .create_dir_all(&self.dir)
                .await
                .map_err(|e| PocketcamError::filesystem("create", &self.dir, e))?;
            info!("Created catalog directory: {}", self.dir.display());
        }
        Ok(())
    }

    /// Snapshot of allow-listed files in storage enumeration order (not sorted)
    pub async fn list(&self) -> Result<Vec<CatalogEntry>> {
        let listed = match self.filesystem.read_dir(&self.dir).await {
            Ok(listed) => listed,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Nothing has been committed yet
                debug!("Catalog directory {} does not exist yet", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                error!("Failed to load media files from {}: {}", self.dir.display(), e);
                return Err(PocketcamError::filesystem("read directory", &self.dir, e));
            }
        };

        let entries: Vec<CatalogEntry> = listed
            .into_iter()
            .filter(|entry| entry.is_file)
            .filter_map(|entry| CatalogEntry::from_path(entry.path))
            .collect();

        debug!("Catalog lists {} media entries", entries.len());
        Ok(entries)
    }

    /// Move a catalog file to `<catalogDir>/<new_name>`
    pub async fn rename(&self, path: &Path, new_name: &str) -> Result<CatalogEntry> {
        self.apply_rename(&RenameRequest::new(path, new_name)).await
    }

    /// Execute a validated rename command. Existing destinations are refused.
    pub async fn apply_rename(&self, request: &RenameRequest) -> Result<CatalogEntry> {
        request.validate()?;
        let source = self.resolve_member(&request.target_path)?;
        let destination = request.destination(&self.dir);

        if source == destination {
            debug!("Rename of {} is a no-op", source.display());
            return self.entry_for(destination);
        }

        self.ensure_vacant(&destination).await?;

        self.filesystem
            .move_file(&source, &destination)
            .await
            .map_err(|e| {
                error!("Failed to rename {}: {}", source.display(), e);
                PocketcamError::filesystem("rename", &source, e)
            })?;

        info!("Renamed {} to {}", source.display(), destination.display());
        self.event_bus.emit(MediaEvent::EntryRenamed {
            from: source,
            to: destination.clone(),
        });

        self.entry_for(destination)
    }

    /// Delete a catalog file
    pub async fn remove(&self, path: &Path) -> Result<()> {
        let target = self.resolve_member(path)?;

        self.filesystem.remove_file(&target).await.map_err(|e| {
            error!("Failed to delete {}: {}", target.display(), e);
            PocketcamError::filesystem("delete", &target, e)
        })?;

        info!("Removed {}", target.display());
        self.event_bus.emit(MediaEvent::EntryRemoved { path: target });
        Ok(())
    }

    /// Move an external file (a staged capture) into the catalog under `name`
    pub async fn import(&self, source: &Path, name: &str) -> Result<CatalogEntry> {
        validate_file_name(name)?;
        let destination = self.dir.join(name);

        self.ensure_directory().await?;
        self.ensure_vacant(&destination).await?;

        self.filesystem
            .move_file(source, &destination)
            .await
            .map_err(|e| {
                error!(
                    "Failed to move {} into catalog: {}",
                    source.display(),
                    e
                );
                PocketcamError::filesystem("move", source, e)
            })?;

        debug!("Imported {} as {}", source.display(), destination.display());
        self.entry_for(destination)
    }

    /// Map a caller-supplied path onto a direct child of the catalog directory
    fn resolve_member(&self, path: &Path) -> Result<PathBuf> {
        let file_name = path
            .file_name()
            .ok_or_else(|| PocketcamError::filesystem("resolve", path, "path has no file name"))?;

        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Ok(self.dir.join(file_name)),
            None => Ok(self.dir.join(file_name)),
            Some(parent) if lexical_absolute(parent) == lexical_absolute(&self.dir) => {
                Ok(self.dir.join(file_name))
            }
            Some(_) => Err(PocketcamError::filesystem(
                "resolve",
                path,
                "path is outside the catalog directory",
            )),
        }
    }

    async fn ensure_vacant(&self, destination: &Path) -> Result<()> {
        let taken = self
            .filesystem
            .exists(destination)
            .await
            .map_err(|e| PocketcamError::filesystem("inspect", destination, e))?;

        if taken {
            return Err(PocketcamError::NameCollision {
                path: destination.display().to_string(),
            });
        }
        Ok(())
    }

    fn entry_for(&self, path: PathBuf) -> Result<CatalogEntry> {
        let display = path.display().to_string();
        CatalogEntry::from_path(path).ok_or_else(|| PocketcamError::InvalidName {
            name: display,
            reason: "not an allow-listed media file".to_string(),
        })
    }
}

/// Absolute form of `path` with `.` and `..` folded away, without touching the filesystem
pub(crate) fn lexical_absolute(path: &Path) -> PathBuf {
    let anchored = if path.is_relative() {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    } else {
        path.to_path_buf()
    };

    let mut normalized = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
