use std::fmt;
use std::time::Duration;

/// Why a single echo probe did not get a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// No reply arrived before the probe timeout.
    Timeout,
    /// The destination could not be reached or answered with something other than an echo reply.
    Unreachable,
    /// The hostname could not be resolved to an address.
    Resolution,
    /// A local socket error, e.g. no permission to open an ICMP socket.
    Network,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Unreachable => "unreachable",
            FailureReason::Resolution => "resolution failed",
            FailureReason::Network => "network error",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Success,
    Failure(FailureReason),
}

/// Outcome of one echo probe to one host.
///
/// Failures carry a zero round-trip time, which statistics never average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub round_trip_time: Duration,
    pub status: ProbeStatus,
}

impl ProbeResult {
    pub fn success(round_trip_time: Duration) -> Self {
        Self {
            round_trip_time,
            status: ProbeStatus::Success,
        }
    }

    pub fn failure(reason: FailureReason) -> Self {
        Self {
            round_trip_time: Duration::ZERO,
            status: ProbeStatus::Failure(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }

    /// Round-trip time in milliseconds, only for successful probes.
    pub fn rtt_ms(&self) -> Option<f64> {
        self.is_success()
            .then(|| self.round_trip_time.as_secs_f64() * 1000.0)
    }
}
