use super::navigator::ViewerNavigator;
use super::transport::{PlaybackDevice, PlaybackEvent, TransportState};
use crate::catalog::CatalogEntry;
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An open viewer: the navigator plus the playback event subscription feeding it.
/// Call `close()` when the viewer goes away.
pub struct ViewerSession {
    navigator: Arc<Mutex<ViewerNavigator>>,
    device: Arc<dyn PlaybackDevice>,
    token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl ViewerSession {
    pub fn open(
        navigator: ViewerNavigator,
        device: Arc<dyn PlaybackDevice>,
        mut events: mpsc::Receiver<PlaybackEvent>,
    ) -> Self {
        info!(
            "Opening viewer at {}/{}",
            navigator.index() + 1,
            navigator.len()
        );

        let navigator = Arc::new(Mutex::new(navigator));
        let token = CancellationToken::new();
        let task_navigator = Arc::clone(&navigator);
        let task_token = token.clone();

        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            task_navigator.lock().handle_playback_event(&event);
                        }
                        None => {
                            debug!("Playback event stream closed");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            navigator,
            device,
            token,
            listener: Mutex::new(Some(listener)),
        }
    }

    pub fn current(&self) -> CatalogEntry {
        self.navigator.lock().current().clone()
    }

    pub fn index(&self) -> usize {
        self.navigator.lock().index()
    }

    pub fn transport(&self) -> Option<TransportState> {
        self.navigator.lock().transport()
    }

    pub fn next(&self) -> CatalogEntry {
        self.navigator.lock().next().clone()
    }

    pub fn previous(&self) -> CatalogEntry {
        self.navigator.lock().previous().clone()
    }

    pub async fn toggle_play_pause(&self) -> Result<bool> {
        let (path, paused) = {
            let mut navigator = self.navigator.lock();
            let paused = navigator.toggle_play_pause()?;
            (navigator.current().path.clone(), paused)
        };
        self.device.set_paused(&path, paused).await?;
        Ok(paused)
    }

    /// Seek ahead by the configured step
    pub async fn seek_forward(&self) -> Result<Duration> {
        let (path, target) = {
            let navigator = self.navigator.lock();
            let target = navigator.seek_forward(navigator.seek_step())?;
            (navigator.current().path.clone(), target)
        };
        self.device.seek(&path, target).await?;
        Ok(target)
    }

    pub async fn seek_backward(&self) -> Result<Duration> {
        let (path, target) = {
            let navigator = self.navigator.lock();
            let target = navigator.seek_backward(navigator.seek_step())?;
            (navigator.current().path.clone(), target)
        };
        self.device.seek(&path, target).await?;
        Ok(target)
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Drop the playback subscription and wait for the listener to exit
    pub async fn close(self) {
        self.token.cancel();
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            if let Err(e) = listener.await {
                warn!("Viewer listener ended abnormally: {}", e);
            }
        }
        info!("Viewer closed");
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
