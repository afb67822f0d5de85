use super::gate::PermissionDomain;
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Platform permission prompt; answers with a granted flag per requested domain
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn request(
        &self,
        domains: &[PermissionDomain],
    ) -> Result<HashMap<PermissionDomain, bool>>;
}

/// Provider with fixed answers, for tests and headless runs
pub struct StaticPermissionProvider {
    responses: Mutex<HashMap<PermissionDomain, bool>>,
    delay: Option<Duration>,
    requests: AtomicUsize,
}

impl StaticPermissionProvider {
    /// Answer every domain with the same decision
    pub fn new(granted: bool) -> Self {
        let responses = PermissionDomain::ALL
            .iter()
            .map(|domain| (*domain, granted))
            .collect();

        Self {
            responses: Mutex::new(responses),
            delay: None,
            requests: AtomicUsize::new(0),
        }
    }

    /// Hold every answer back for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_granted(&self, domain: PermissionDomain, granted: bool) {
        self.responses.lock().insert(domain, granted);
    }

    /// Number of prompts shown so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissionProvider {
    async fn request(
        &self,
        domains: &[PermissionDomain],
    ) -> Result<HashMap<PermissionDomain, bool>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        debug!("Static permission prompt for {:?}", domains);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let responses = self.responses.lock();
        Ok(domains
            .iter()
            .map(|domain| (*domain, responses.get(domain).copied().unwrap_or(false)))
            .collect())
    }
}
