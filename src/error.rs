use thiserror::Error;

/// Errors raised by [`HostRegistry`](crate::registry::HostRegistry).
///
/// Both variants are wiring mistakes made at setup time rather than
/// conditions of the network being probed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("host '{0}' is already registered")]
    DuplicateHost(String),

    #[error("host '{0}' was never registered")]
    UnknownHost(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyStarted,

    #[error("scheduler has been stopped and cannot be restarted")]
    Stopped,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find config directory")]
    NoConfigDir,

    #[error("config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no hosts configured")]
    NoHosts,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
