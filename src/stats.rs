//! Statistics derived from host logs.
//!
//! Everything here is a pure function of its input: a snapshot of a log (or
//! of the whole registry) goes in, numbers come out. Empty inputs produce 0
//! rather than an error or NaN.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::host_log::HostLog;
use crate::ping::ProbeResult;
use crate::registry::HostRegistry;

/// Number of leading log entries jitter is computed over by default.
pub const DEFAULT_JITTER_WINDOW: usize = 50;

/// Which part of a log jitter is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterWindow {
    /// The first `n` entries of the log, in probe-issue order.
    First(usize),
    /// The entire log.
    Entire,
}

impl JitterWindow {
    /// `0` is the "entire log" sentinel used in config files.
    pub fn from_size(size: usize) -> Self {
        if size == 0 {
            JitterWindow::Entire
        } else {
            JitterWindow::First(size)
        }
    }
}

impl Default for JitterWindow {
    fn default() -> Self {
        JitterWindow::First(DEFAULT_JITTER_WINDOW)
    }
}

pub fn success_count(entries: &[ProbeResult]) -> usize {
    entries.iter().filter(|r| r.is_success()).count()
}

pub fn failure_count(entries: &[ProbeResult]) -> usize {
    entries.len() - success_count(entries)
}

/// Mean RTT in ms over successful probes only; 0 when there are none.
pub fn average_rtt_ms(entries: &[ProbeResult]) -> f64 {
    mean(entries.iter().filter_map(ProbeResult::rtt_ms))
}

/// Share of probes without a reply, in percent; 0 for an empty log.
pub fn loss_percent(failures: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * failures as f64 / total as f64
    }
}

/// Sample standard deviation of the RTT of successful probes within `window`.
pub fn jitter_ms(entries: &[ProbeResult], window: JitterWindow) -> f64 {
    let window = match window {
        JitterWindow::First(n) => &entries[..n.min(entries.len())],
        JitterWindow::Entire => entries,
    };
    std_dev(window.iter().filter_map(ProbeResult::rtt_ms))
}

pub fn mean(samples: impl IntoIterator<Item = f64>) -> f64 {
    let (count, sum) = samples
        .into_iter()
        .fold((0usize, 0.0), |(count, sum), x| (count + 1, sum + x));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Bessel-corrected standard deviation using Welford's running update.
/// Returns 0 for fewer than two samples.
pub fn std_dev(samples: impl IntoIterator<Item = f64>) -> f64 {
    let mut n = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;

    for x in samples {
        n += 1;
        let delta = x - mean;
        mean += delta / n as f64;
        m2 += delta * (x - mean);
    }

    if n < 2 {
        0.0
    } else {
        (m2 / (n - 1) as f64).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostStats {
    pub host: String,
    pub count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub average_rtt_ms: f64,
    pub jitter_ms: f64,
    pub loss_percent: f64,
}

impl HostStats {
    pub fn from_log(host: impl Into<String>, log: &HostLog, window: JitterWindow) -> Self {
        let entries = log.entries();
        let count = entries.len();
        let success_count = success_count(entries);
        let failure_count = count - success_count;

        Self {
            host: host.into(),
            count,
            success_count,
            failure_count,
            average_rtt_ms: average_rtt_ms(entries),
            jitter_ms: jitter_ms(entries, window),
            loss_percent: loss_percent(failure_count, count),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalStats {
    pub total_requests: usize,
    pub total_success: usize,
    pub total_failures: usize,
    pub total_loss_percent: f64,
}

impl GlobalStats {
    pub fn from_hosts(hosts: &[HostStats]) -> Self {
        let total_requests: usize = hosts.iter().map(|h| h.count).sum();
        let total_failures: usize = hosts.iter().map(|h| h.failure_count).sum();

        Self {
            total_requests,
            total_success: total_requests - total_failures,
            total_failures,
            total_loss_percent: loss_percent(total_failures, total_requests),
        }
    }
}

/// Point-in-time statistics for every host plus the run totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub hosts: Vec<HostStats>,
    pub global: GlobalStats,
    pub elapsed: Duration,
    pub started_at: Option<DateTime<Local>>,
    pub probe_interval: Duration,
}

impl Snapshot {
    /// Per-host and global statistics, hosts in registration order.
    pub fn from_hosts(hosts: Vec<HostStats>, elapsed: Duration) -> Self {
        let global = GlobalStats::from_hosts(&hosts);
        Self {
            hosts,
            global,
            elapsed,
            started_at: None,
            probe_interval: Duration::ZERO,
        }
    }

    pub fn capture(registry: &HostRegistry, started: Instant, window: JitterWindow) -> Self {
        let hosts = registry
            .hosts()
            .iter()
            .filter_map(|host| {
                let log = registry.snapshot_log(host).ok()?;
                Some(HostStats::from_log(host.as_str(), &log, window))
            })
            .collect();
        Self::from_hosts(hosts, started.elapsed())
    }

    pub fn with_started_at(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    pub fn host(&self, host: &str) -> Option<&HostStats> {
        self.hosts.iter().find(|h| h.host == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::FailureReason;

    fn ok(ms: u64) -> ProbeResult {
        ProbeResult::success(Duration::from_millis(ms))
    }

    fn lost() -> ProbeResult {
        ProbeResult::failure(FailureReason::Timeout)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_std_dev_of_known_samples() {
        assert_close(std_dev([10.0, 20.0, 30.0]), 10.0);
        assert_close(std_dev([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.138089935299395);
    }

    #[test]
    fn test_std_dev_needs_two_samples() {
        assert_eq!(std_dev(Vec::new()), 0.0);
        assert_eq!(std_dev([42.0]), 0.0);
    }

    #[test]
    fn test_std_dev_stable_with_large_offset() {
        let samples = [1e9 + 4.0, 1e9 + 7.0, 1e9 + 13.0, 1e9 + 16.0];
        assert!((std_dev(samples) - 30.0f64.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_jitter_ignores_failures() {
        let entries = [ok(10), lost(), ok(20), lost(), ok(30)];
        assert_close(jitter_ms(&entries, JitterWindow::default()), 10.0);
    }

    #[test]
    fn test_jitter_single_success_is_zero() {
        let entries = [lost(), ok(25), lost()];
        assert_eq!(jitter_ms(&entries, JitterWindow::Entire), 0.0);
    }

    #[test]
    fn test_jitter_uses_earliest_prefix() {
        let entries = [ok(10), ok(20), ok(30), ok(1000)];
        assert_close(jitter_ms(&entries, JitterWindow::First(3)), 10.0);
        assert!(jitter_ms(&entries, JitterWindow::Entire) > 10.0);
        // Window larger than the log takes everything.
        assert_eq!(
            jitter_ms(&entries, JitterWindow::First(100)),
            jitter_ms(&entries, JitterWindow::Entire)
        );
    }

    #[test]
    fn test_jitter_window_sentinel() {
        assert_eq!(JitterWindow::from_size(0), JitterWindow::Entire);
        assert_eq!(JitterWindow::from_size(50), JitterWindow::default());
    }

    #[test]
    fn test_average_excludes_failures() {
        let entries = [ok(10), lost(), ok(30)];
        assert_eq!(success_count(&entries), 2);
        assert_eq!(failure_count(&entries), 1);
        assert_close(average_rtt_ms(&entries), 20.0);
        assert_eq!(average_rtt_ms(&[lost(), lost()]), 0.0);
        assert_eq!(average_rtt_ms(&[]), 0.0);
    }

    #[test]
    fn test_loss_percent_bounds() {
        assert_eq!(loss_percent(0, 0), 0.0);
        assert_eq!(loss_percent(0, 10), 0.0);
        assert_eq!(loss_percent(10, 10), 100.0);
        assert_close(loss_percent(1, 3), 100.0 / 3.0);
    }

    #[test]
    fn test_host_stats_counts_add_up() {
        let log: HostLog = [ok(10), lost(), lost(), ok(12), lost()].into_iter().collect();
        let stats = HostStats::from_log("a", &log, JitterWindow::default());

        assert_eq!(stats.count, 5);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 3);
        assert_eq!(stats.success_count + stats.failure_count, stats.count);
        assert_close(stats.loss_percent, 60.0);
        assert_close(stats.average_rtt_ms, 11.0);
    }

    #[test]
    fn test_empty_host_stats() {
        let stats = HostStats::from_log("a", &HostLog::new(), JitterWindow::default());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.average_rtt_ms, 0.0);
        assert_eq!(stats.jitter_ms, 0.0);
        assert_eq!(stats.loss_percent, 0.0);
    }

    #[test]
    fn test_global_totals_sum_hosts() {
        let a: HostLog = [ok(10), lost()].into_iter().collect();
        let b: HostLog = [lost(), lost(), lost()].into_iter().collect();
        let c = HostLog::new();
        let hosts = vec![
            HostStats::from_log("a", &a, JitterWindow::default()),
            HostStats::from_log("b", &b, JitterWindow::default()),
            HostStats::from_log("c", &c, JitterWindow::default()),
        ];

        let global = GlobalStats::from_hosts(&hosts);
        assert_eq!(global.total_requests, 5);
        assert_eq!(global.total_failures, 4);
        assert_eq!(global.total_success, 1);
        assert_close(global.total_loss_percent, 80.0);
    }

    #[test]
    fn test_global_empty_run() {
        let global = GlobalStats::from_hosts(&[]);
        assert_eq!(global, GlobalStats::default());
    }

    #[test]
    fn test_capture_from_registry() {
        let registry = HostRegistry::from_hosts(["a", "b"]).unwrap();
        registry.append("a", ok(20)).unwrap();
        registry.append("b", lost()).unwrap();

        let snapshot = Snapshot::capture(&registry, Instant::now(), JitterWindow::default());
        let names: Vec<_> = snapshot.hosts.iter().map(|h| h.host.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(snapshot.global.total_requests, 2);
        assert_close(snapshot.global.total_loss_percent, 50.0);
        assert_eq!(snapshot.host("b").map(|h| h.failure_count), Some(1));
    }
}
