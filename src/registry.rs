//! Thread-safe mapping from host to its probe log.
//!
//! The key set is fixed before the run: `register` needs `&mut self`, and once
//! the registry is shared behind an `Arc` only `append` and `snapshot_log`
//! remain reachable. Every host gets its own lock, so writers for different
//! hosts never contend and a reader only blocks the host it is copying.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::RegistryError;
use crate::host_log::HostLog;
use crate::ping::ProbeResult;

#[derive(Debug, Default)]
pub struct HostRegistry {
    hosts: Vec<String>,
    index: HashMap<String, usize>,
    logs: Vec<Mutex<HostLog>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with one empty log per host, in the given order.
    pub fn from_hosts<I, S>(hosts: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for host in hosts {
            registry.register(host)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, host: impl Into<String>) -> Result<(), RegistryError> {
        let host = host.into();
        if self.index.contains_key(&host) {
            return Err(RegistryError::DuplicateHost(host));
        }

        self.index.insert(host.clone(), self.logs.len());
        self.hosts.push(host);
        self.logs.push(Mutex::new(HostLog::new()));
        Ok(())
    }

    pub fn append(&self, host: &str, result: ProbeResult) -> Result<(), RegistryError> {
        self.lock(host)?.push(result);
        Ok(())
    }

    /// Copy of the host's log as of now. A concurrent append may or may not
    /// be included, but never half of one.
    pub fn snapshot_log(&self, host: &str) -> Result<HostLog, RegistryError> {
        Ok(self.lock(host)?.clone())
    }

    /// Registered hosts in registration order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    fn lock(&self, host: &str) -> Result<MutexGuard<'_, HostLog>, RegistryError> {
        let slot = self
            .index
            .get(host)
            .ok_or_else(|| RegistryError::UnknownHost(host.to_string()))?;
        // A push either happened or it didn't, so a poisoned log is still consistent.
        Ok(self.logs[*slot]
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }
}
