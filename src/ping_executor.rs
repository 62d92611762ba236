use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};

use crate::dns_cache::DnsCache;
use crate::ping::{FailureReason, ProbeResult};
use crate::prober::Pinger;

/// Same payload size as the Windows `ping` default.
const PAYLOAD: [u8; 32] = [0; 32];

/// Strip a configured host down to something the resolver accepts.
///
/// A trailing `:port` is cut off; of the rest only letters, digits, `.` and
/// `-` survive. `None` when nothing is left to resolve.
fn sanitize_hostname(host: &str) -> Option<String> {
    let name = match host.split_once(':') {
        Some((name, _port)) => name,
        None => host,
    };
    let cleaned: String = name
        .chars()
        .filter(|&c| c.is_alphanumeric() || matches!(c, '.' | '-'))
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// First resolved address we hold a socket for. IPv6 answers are skipped
/// when no ICMPv6 client could be opened.
fn pick_address(addrs: impl IntoIterator<Item = SocketAddr>, has_v6: bool) -> Option<IpAddr> {
    addrs
        .into_iter()
        .map(|addr| addr.ip())
        .find(|ip| ip.is_ipv4() || has_v6)
}

fn classify(error: &SurgeError) -> FailureReason {
    match error {
        SurgeError::Timeout { .. } => FailureReason::Timeout,
        SurgeError::IOError(_) => FailureReason::Network,
        _ => FailureReason::Unreachable,
    }
}

/// ICMP echo pinger backed by `surge-ping`.
///
/// One client per address family is shared by every probe. Each probe gets a
/// fresh sequence number so overlapping ticks to the same host never collide.
pub struct SurgePinger {
    v4: Client,
    v6: Option<Client>,
    identifier: PingIdentifier,
    sequence: AtomicU16,
    timeout: Duration,
    dns_cache: Mutex<DnsCache>,
}

impl SurgePinger {
    /// Opens the ICMP sockets. Must run inside a tokio runtime.
    ///
    /// Fails when no ICMPv4 socket can be opened, typically for lack of
    /// privileges. A missing ICMPv6 socket only disables IPv6 hosts.
    pub fn new(timeout: Duration, dns_ttl: Duration) -> io::Result<Self> {
        let v4 = Client::new(&Config::default())?;
        let v6 = match Client::new(&Config::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("ICMPv6 socket unavailable, IPv6 hosts will fail: {}", e);
                None
            }
        };

        Ok(Self {
            v4,
            v6,
            identifier: PingIdentifier(std::process::id() as u16),
            sequence: AtomicU16::new(0),
            timeout,
            dns_cache: Mutex::new(DnsCache::new(dns_ttl)),
        })
    }

    /// Resolve hostname to IP address, going through the cache.
    async fn resolve_target(&self, target: &str) -> Result<IpAddr, FailureReason> {
        // Literal addresses skip resolution and the cache.
        if let Ok(ip) = target.parse::<IpAddr>() {
            return Ok(ip);
        }

        let now = Instant::now();
        let cached = self.cache().get_valid_ip(target, now);
        if let Some(ip) = cached {
            return Ok(ip);
        }

        let sanitized = sanitize_hostname(target).ok_or(FailureReason::Resolution)?;
        let resolved = match tokio::net::lookup_host(format!("{sanitized}:0")).await {
            Ok(addrs) => pick_address(addrs, self.v6.is_some()),
            Err(e) => {
                warn!("Failed to resolve {}: {}", target, e);
                None
            }
        };
        let ip = resolved.ok_or(FailureReason::Resolution)?;

        let mut cache = self.cache();
        cache.clean_expired(now);
        cache.insert(target, ip, now);
        debug!("Resolved {} to {}", target, ip);
        Ok(ip)
    }

    fn cache(&self) -> MutexGuard<'_, DnsCache> {
        self.dns_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Pinger for SurgePinger {
    async fn ping(&self, host: &str) -> ProbeResult {
        let target_ip = match self.resolve_target(host).await {
            Ok(ip) => ip,
            Err(reason) => return ProbeResult::failure(reason),
        };

        let client = match (target_ip, &self.v6) {
            (IpAddr::V4(_), _) => &self.v4,
            (IpAddr::V6(_), Some(v6)) => v6,
            (IpAddr::V6(_), None) => return ProbeResult::failure(FailureReason::Network),
        };

        let mut pinger = client.pinger(target_ip, self.identifier).await;
        pinger.timeout(self.timeout);

        let sequence = PingSequence(self.sequence.fetch_add(1, Ordering::Relaxed));
        match pinger.ping(sequence, &PAYLOAD).await {
            Ok((_, duration)) => ProbeResult::success(duration),
            Err(e) => {
                // The address may have moved; resolve again next time.
                self.cache().remove(host);
                ProbeResult::failure(classify(&e))
            }
        }
    }
}
