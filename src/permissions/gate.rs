use super::provider::PermissionProvider;
use crate::error::{PocketcamError, Result};
use crate::events::{EventBus, MediaEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Independent permission domains a component can be gated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionDomain {
    /// Camera and microphone
    Capture,
    /// Location and motion sensors
    LocationMotion,
}

impl PermissionDomain {
    pub const ALL: [PermissionDomain; 2] =
        [PermissionDomain::Capture, PermissionDomain::LocationMotion];

    pub fn denial_title(&self) -> &'static str {
        match self {
            PermissionDomain::Capture => "Permission Denied",
            PermissionDomain::LocationMotion => "Permissions not granted",
        }
    }

    pub fn denial_message(&self) -> &'static str {
        match self {
            PermissionDomain::Capture => {
                "Camera permission is required to take photos or record videos."
            }
            PermissionDomain::LocationMotion => {
                "Please enable location and sensor permissions in your device settings."
            }
        }
    }
}

impl fmt::Display for PermissionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionDomain::Capture => write!(f, "capture"),
            PermissionDomain::LocationMotion => write!(f, "location+motion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Unknown,
    Requesting,
    Granted,
    Denied,
}

/// Tracks the grant state of each permission domain and owns every transition
pub struct PermissionGate {
    states: RwLock<HashMap<PermissionDomain, PermissionState>>,
    provider: Arc<dyn PermissionProvider>,
    event_bus: Arc<EventBus>,
    request_timeout: Duration,
}

impl PermissionGate {
    pub fn new(
        provider: Arc<dyn PermissionProvider>,
        event_bus: Arc<EventBus>,
        request_timeout: Duration,
    ) -> Self {
        let states = PermissionDomain::ALL
            .iter()
            .map(|domain| (*domain, PermissionState::Unknown))
            .collect();

        Self {
            states: RwLock::new(states),
            provider,
            event_bus,
            request_timeout,
        }
    }

    /// Current state of a domain; never waits on an in-flight request
    pub fn status(&self, domain: PermissionDomain) -> PermissionState {
        self.states
            .read()
            .get(&domain)
            .copied()
            .unwrap_or(PermissionState::Unknown)
    }

    pub fn is_granted(&self, domain: PermissionDomain) -> bool {
        self.status(domain) == PermissionState::Granted
    }

    /// Fail with `PermissionDenied` unless the domain is granted
    pub fn require(&self, domain: PermissionDomain) -> Result<()> {
        if self.is_granted(domain) {
            Ok(())
        } else {
            Err(PocketcamError::PermissionDenied { domain })
        }
    }

    /// Ask the platform for a domain. A request already in flight makes this a no-op.
    pub async fn request(&self, domain: PermissionDomain) -> Result<PermissionState> {
        let previous = {
            let mut states = self.states.write();
            let current = states
                .get(&domain)
                .copied()
                .unwrap_or(PermissionState::Unknown);

            match current {
                PermissionState::Requesting => {
                    debug!("Permission request for {} already in flight", domain);
                    return Ok(PermissionState::Requesting);
                }
                PermissionState::Granted => {
                    debug!("Permission {} already granted", domain);
                    return Ok(PermissionState::Granted);
                }
                PermissionState::Unknown | PermissionState::Denied => {
                    states.insert(domain, PermissionState::Requesting);
                    current
                }
            }
        };

        self.event_bus.emit(MediaEvent::PermissionChanged {
            domain,
            state: PermissionState::Requesting,
        });
        info!("Requesting {} permission", domain);

        let response =
            tokio::time::timeout(self.request_timeout, self.provider.request(&[domain])).await;

        let resolved = match response {
            Ok(Ok(statuses)) => {
                if statuses.get(&domain).copied().unwrap_or(false) {
                    PermissionState::Granted
                } else {
                    PermissionState::Denied
                }
            }
            Ok(Err(e)) => {
                warn!("Permission provider failed for {}: {}", domain, e);
                PermissionState::Denied
            }
            Err(_) => {
                warn!(
                    "Permission request for {} timed out after {:?}",
                    domain, self.request_timeout
                );
                self.set_state(domain, previous);
                let error = PocketcamError::timeout("Permission request", self.request_timeout);
                let (title, message) = error.notice();
                self.event_bus.emit(MediaEvent::notice(title, message));
                return Err(error);
            }
        };

        self.set_state(domain, resolved);

        if resolved == PermissionState::Denied {
            self.event_bus.emit(MediaEvent::notice(
                domain.denial_title(),
                domain.denial_message(),
            ));
        }

        info!("Permission {} resolved to {:?}", domain, resolved);
        Ok(resolved)
    }

    fn set_state(&self, domain: PermissionDomain, state: PermissionState) {
        self.states.write().insert(domain, state);
        self.event_bus
            .emit(MediaEvent::PermissionChanged { domain, state });
    }
}
