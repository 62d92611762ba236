//! Continuous packet loss, latency and jitter monitoring for a fixed set of hosts.
//!
//! A [`Monitor`] pings every host on one cadence and turns the accumulated
//! results into a [`Snapshot`] on another, handing each snapshot to a
//! [`Reporter`]. Probe outcomes live in a [`HostRegistry`], the only state
//! shared between the probing and reporting sides.

pub mod app;
pub mod config;
pub mod dns_cache;
pub mod error;
pub mod host_log;
pub mod monitor;
pub mod ping;
pub mod ping_executor;
pub mod prober;
pub mod registry;
pub mod reporter;
pub mod scheduler;
pub mod stats;
pub mod status_color;

pub use app::LossMonitorApp;
pub use config::{AppConfig, parse_interval};
pub use error::{ConfigError, MonitorError, RegistryError, SchedulerError};
pub use host_log::HostLog;
pub use monitor::{Monitor, MonitorSettings};
pub use ping::{FailureReason, ProbeResult, ProbeStatus};
pub use ping_executor::SurgePinger;
pub use prober::{Pinger, Prober};
pub use registry::HostRegistry;
pub use reporter::{LatestSnapshot, LogReporter, Reporter, Reporters};
pub use scheduler::Scheduler;
pub use stats::{GlobalStats, HostStats, JitterWindow, Snapshot};
