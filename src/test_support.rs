use crate::events::EventBus;
use crate::storage::{DirEntryInfo, Filesystem, LocalFilesystem};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Local filesystem with switchable failures and delays
#[derive(Default)]
pub struct FaultyFilesystem {
    inner: LocalFilesystem,
    pub fail_moves: AtomicBool,
    pub fail_removes: AtomicBool,
    pub fail_reads: AtomicBool,
    move_delay: Mutex<Option<Duration>>,
    remove_delay: Mutex<Option<Duration>>,
}

impl FaultyFilesystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_removes(&self, fail: bool) {
        self.fail_removes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Stall moves before they touch the disk
    pub fn set_move_delay(&self, delay: Option<Duration>) {
        *self.move_delay.lock() = delay;
    }

    pub fn set_remove_delay(&self, delay: Option<Duration>) {
        *self.remove_delay.lock() = delay;
    }

    fn injected(operation: &str) -> io::Error {
        io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("injected {} failure", operation),
        )
    }
}

#[async_trait]
impl Filesystem for FaultyFilesystem {
    async fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected("read_dir"));
        }
        self.inner.read_dir(dir).await
    }

    async fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let delay = *self.move_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(Self::injected("move"));
        }
        self.inner.move_file(from, to).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let delay = *self.remove_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(Self::injected("remove"));
        }
        self.inner.remove_file(path).await
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        self.inner.exists(path).await
    }

    async fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        self.inner.create_dir_all(dir).await
    }
}

pub fn event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::new(64))
}

/// Sorted file names in a directory
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
