//! Fan-out of one echo probe per host into the registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};
use tokio::task::JoinSet;

use crate::ping::{FailureReason, ProbeResult, ProbeStatus};
use crate::registry::HostRegistry;

/// Sends one echo request to a host and classifies the outcome.
///
/// Implementations must not fail: every network problem becomes a
/// `ProbeResult::failure` for that host.
#[async_trait]
pub trait Pinger: Send + Sync + 'static {
    async fn ping(&self, host: &str) -> ProbeResult;
}

#[derive(Clone)]
pub struct Prober {
    registry: Arc<HostRegistry>,
    pinger: Arc<dyn Pinger>,
}

impl Prober {
    pub fn new(registry: Arc<HostRegistry>, pinger: Arc<dyn Pinger>) -> Self {
        Self { registry, pinger }
    }

    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    /// Probe every registered host once, concurrently, and append each outcome.
    ///
    /// Each host runs in its own task and records its own result as soon as it
    /// has one, so a slow host never holds back the others. A task that
    /// panics is recorded as a network failure for its host.
    pub async fn probe_once(&self) {
        let mut tasks = JoinSet::new();
        let mut hosts_by_task = HashMap::new();

        for host in self.registry.hosts() {
            let registry = Arc::clone(&self.registry);
            let pinger = Arc::clone(&self.pinger);
            let task_host = host.clone();

            let handle = tasks.spawn(async move {
                let result = pinger.ping(&task_host).await;
                if let ProbeStatus::Failure(reason) = result.status {
                    debug!("Probe to {} failed: {}", task_host, reason);
                }
                record(&registry, &task_host, result);
            });
            hosts_by_task.insert(handle.id(), host.clone());
        }

        while let Some(joined) = tasks.join_next().await {
            let Err(join_error) = joined else { continue };
            let Some(host) = hosts_by_task.get(&join_error.id()) else {
                continue;
            };
            error!("Probe task for {} did not complete: {}", host, join_error);
            record(&self.registry, host, ProbeResult::failure(FailureReason::Network));
        }
    }
}

fn record(registry: &HostRegistry, host: &str, result: ProbeResult) {
    // Hosts come from the registry itself, so this only fires on a wiring bug.
    if let Err(e) = registry.append(host, result) {
        error!("Dropping probe result: {}", e);
        debug_assert!(false, "result for a host outside the registry: {e}");
    }
}
