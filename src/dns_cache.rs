use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct CachedAddr {
    ip_address: IpAddr,
    cached_at: Instant,
}

/// Hostname to address cache with a fixed time-to-live.
///
/// Callers pass `now` explicitly so expiry is easy to reason about and test.
#[derive(Debug)]
pub struct DnsCache {
    entries: HashMap<String, CachedAddr>,
    ttl: Duration,
}

impl DnsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Cached address for `hostname`, unless it has expired.
    pub fn get_valid_ip(&self, hostname: &str, now: Instant) -> Option<IpAddr> {
        self.entries
            .get(hostname)
            .filter(|entry| now.saturating_duration_since(entry.cached_at) <= self.ttl)
            .map(|entry| entry.ip_address)
    }

    pub fn insert(&mut self, hostname: impl Into<String>, ip_address: IpAddr, now: Instant) {
        self.entries.insert(
            hostname.into(),
            CachedAddr {
                ip_address,
                cached_at: now,
            },
        );
    }

    pub fn remove(&mut self, hostname: &str) {
        self.entries.remove(hostname);
    }

    pub fn clean_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.cached_at) <= ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
