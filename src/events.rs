use crate::catalog::MediaKind;
use crate::capture::{CameraFacing, CaptureMode};
use crate::error::EventBusError;
use crate::permissions::{PermissionDomain, PermissionState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Events published by the capture, catalog and telemetry components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MediaEvent {
    /// A permission domain changed state
    PermissionChanged {
        domain: PermissionDomain,
        state: PermissionState,
    },
    /// User-facing notice (alerts, confirmations, failures)
    Notice { title: String, message: String },
    /// Capture mode toggled between photo and video
    CaptureModeChanged { mode: CaptureMode },
    /// Camera facing toggled between back and front
    CameraFacingChanged { facing: CameraFacing },
    /// The capture device started recording
    RecordingStarted { timestamp: SystemTime },
    /// The recording reached a terminal state
    RecordingFinished { succeeded: bool, timestamp: SystemTime },
    /// A capture is waiting for commit or discard
    CaptureStaged { suggested_name: String, kind: MediaKind },
    /// The capture device reported a failure
    CaptureFailed { details: String },
    /// A staged capture was moved into the catalog
    MediaCommitted { path: PathBuf },
    /// A staged capture was thrown away
    MediaDiscarded { temporary_path: PathBuf },
    /// A catalog entry was moved to a new name
    EntryRenamed { from: PathBuf, to: PathBuf },
    /// A catalog entry was deleted
    EntryRemoved { path: PathBuf },
    /// New telemetry reading merged into the last-known sample
    TelemetryUpdated { timestamp: SystemTime },
}

impl MediaEvent {
    /// Build a notice event
    pub fn notice<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        MediaEvent::Notice {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            MediaEvent::PermissionChanged { domain, state } => {
                format!("Permission {} is now {:?}", domain, state)
            }
            MediaEvent::Notice { title, message } => format!("{}: {}", title, message),
            MediaEvent::CaptureModeChanged { mode } => format!("Capture mode set to {:?}", mode),
            MediaEvent::CameraFacingChanged { facing } => {
                format!("Camera facing set to {:?}", facing)
            }
            MediaEvent::RecordingStarted { .. } => "Recording started".to_string(),
            MediaEvent::RecordingFinished { succeeded, .. } => {
                if *succeeded {
                    "Recording finished".to_string()
                } else {
                    "Recording failed".to_string()
                }
            }
            MediaEvent::CaptureStaged {
                suggested_name,
                kind,
            } => format!("{:?} staged as {}", kind, suggested_name),
            MediaEvent::CaptureFailed { details } => format!("Capture failed: {}", details),
            MediaEvent::MediaCommitted { path } => format!("Committed {}", path.display()),
            MediaEvent::MediaDiscarded { temporary_path } => {
                format!("Discarded {}", temporary_path.display())
            }
            MediaEvent::EntryRenamed { from, to } => {
                format!("Renamed {} to {}", from.display(), to.display())
            }
            MediaEvent::EntryRemoved { path } => format!("Removed {}", path.display()),
            MediaEvent::TelemetryUpdated { .. } => "Telemetry updated".to_string(),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            MediaEvent::PermissionChanged { .. } => "permission_changed",
            MediaEvent::Notice { .. } => "notice",
            MediaEvent::CaptureModeChanged { .. } => "capture_mode_changed",
            MediaEvent::CameraFacingChanged { .. } => "camera_facing_changed",
            MediaEvent::RecordingStarted { .. } => "recording_started",
            MediaEvent::RecordingFinished { .. } => "recording_finished",
            MediaEvent::CaptureStaged { .. } => "capture_staged",
            MediaEvent::CaptureFailed { .. } => "capture_failed",
            MediaEvent::MediaCommitted { .. } => "media_committed",
            MediaEvent::MediaDiscarded { .. } => "media_discarded",
            MediaEvent::EntryRenamed { .. } => "entry_renamed",
            MediaEvent::EntryRemoved { .. } => "entry_removed",
            MediaEvent::TelemetryUpdated { .. } => "telemetry_updated",
        }
    }
}

/// Event bus for component coordination using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<MediaEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe with a filter applied to every received event
    pub fn subscribe_filtered<S: Into<String>>(&self, filter: EventFilter, name: S) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.into())
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: MediaEvent) -> Result<usize, EventBusError> {
        match &event {
            MediaEvent::Notice { title, message } => {
                info!("Notice: {} - {}", title, message);
            }
            MediaEvent::CaptureFailed { details } => {
                warn!("Capture failed: {}", details);
            }
            _ => debug!("Event: {}", event.description()),
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish an event, tolerating the absence of subscribers
    pub fn emit(&self, event: MediaEvent) {
        let event_type = event.event_type();
        if self.publish(event).is_err() {
            debug!("No subscribers for {} event", event_type);
        }
    }

}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &MediaEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
        }
    }
}

/// Event receiver with filtering capabilities
pub struct EventReceiver {
    receiver: broadcast::Receiver<MediaEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(receiver: broadcast::Receiver<MediaEvent>, filter: EventFilter, name: String) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<MediaEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged { skipped: n });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<MediaEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged { skipped: n });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Drain every pending event that passes the filter
    pub fn drain(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}
