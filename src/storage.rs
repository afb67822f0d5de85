use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A single entry produced by a directory enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub path: PathBuf,
    pub name: String,
    pub is_file: bool,
}

/// Durable storage operations the catalog and staging store depend on
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Enumerate a directory in whatever order the storage yields
    async fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;

    /// Move a file, replacing nothing the caller has not checked for
    async fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    async fn exists(&self, path: &Path) -> io::Result<bool>;

    async fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
}

/// `Filesystem` backed by the local disk through `tokio::fs`
#[derive(Debug, Clone, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut listed = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            listed.push(DirEntryInfo {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file: file_type.is_file(),
            });
        }

        debug!("Enumerated {} entries in {}", listed.len(), dir.display());
        Ok(listed)
    }

    async fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                debug!(
                    "{} and {} are on different devices, copying instead",
                    from.display(),
                    to.display()
                );
                copy_across_devices(from, to).await
            }
            Err(e) => Err(e),
        }
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path).await
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(path).await
    }

    async fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir).await
    }
}

fn is_cross_device(error: &io::Error) -> bool {
    error.raw_os_error() == Some(libc::EXDEV)
}

/// Copy then unlink the source. A failed copy removes whatever it left at `to`.
async fn copy_across_devices(from: &Path, to: &Path) -> io::Result<()> {
    let preexisting = fs::try_exists(to).await.unwrap_or(true);

    if let Err(e) = fs::copy(from, to).await {
        if !preexisting {
            match fs::remove_file(to).await {
                Ok(()) => debug!("Removed partial copy {}", to.display()),
                Err(cleanup) if cleanup.kind() == io::ErrorKind::NotFound => {}
                Err(cleanup) => warn!("Could not remove partial copy {}: {}", to.display(), cleanup),
            }
        }
        return Err(e);
    }

    if let Err(e) = fs::remove_file(from).await {
        warn!("Copied {} but could not remove source: {}", from.display(), e);
    }
    Ok(())
}
