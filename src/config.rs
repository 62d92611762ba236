use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::monitor::MonitorSettings;
use crate::stats::{DEFAULT_JITTER_WINDOW, JitterWindow};

/// Probe interval used when the operator's input is not a positive number.
pub const DEFAULT_INTERVAL_MS: u64 = 1500;
pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_WARMUP_MS: u64 = 500;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_DNS_TTL_SECS: u64 = 60;

const DEFAULT_HOSTS: [&str; 11] = [
    "www.google.com",
    "www.yahoo.com",
    "www.reddit.com",
    "www.microsoft.com",
    "cox.net",
    "bing.com",
    "amazon.com",
    "8.8.8.8",
    "8.8.4.4",
    "stackoverflow.com",
    "gmail.com",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hosts: Vec<String>,
    pub interval_ms: u64,
    pub report_interval_ms: u64,
    pub warmup_ms: u64,
    pub probe_timeout_ms: u64,
    /// Leading entries per host used for jitter; 0 means the whole log.
    pub jitter_window: usize,
    pub dns_ttl_secs: u64,
    pub green_threshold: u64,
    pub yellow_threshold: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hosts: DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect(),
            interval_ms: DEFAULT_INTERVAL_MS,
            report_interval_ms: DEFAULT_REPORT_INTERVAL_MS,
            warmup_ms: DEFAULT_WARMUP_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            jitter_window: DEFAULT_JITTER_WINDOW,
            dns_ttl_secs: DEFAULT_DNS_TTL_SECS,
            green_threshold: 100,
            yellow_threshold: 200,
        }
    }
}

/// Parse an operator-entered probe interval in milliseconds.
///
/// Anything that is not a positive whole number falls back to `default_ms`.
pub fn parse_interval(input: &str, default_ms: u64) -> Duration {
    match input.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => Duration::from_millis(default_ms),
    }
}

impl AppConfig {
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("PacketLossMonitor");

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("config.json"))
    }

    /// Load the user's config, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        let loaded = Self::get_config_path().and_then(|path| {
            if path.exists() {
                Self::load_from(&path).map(Some)
            } else {
                Ok(None)
            }
        });

        match loaded {
            Ok(Some(config)) => config.normalized(),
            Ok(None) => AppConfig::default(),
            Err(e) => {
                warn!("Failed to load config, using defaults: {}", e);
                AppConfig::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Replace zero durations, which cannot drive a timer, with their defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = AppConfig::default();
        for (name, value, default) in [
            ("interval_ms", &mut self.interval_ms, defaults.interval_ms),
            (
                "report_interval_ms",
                &mut self.report_interval_ms,
                defaults.report_interval_ms,
            ),
            (
                "probe_timeout_ms",
                &mut self.probe_timeout_ms,
                defaults.probe_timeout_ms,
            ),
        ] {
            if *value == 0 {
                warn!("{} must be positive, using {}", name, default);
                *value = default;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        Ok(())
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn dns_ttl(&self) -> Duration {
        Duration::from_secs(self.dns_ttl_secs)
    }

    pub fn settings(&self) -> MonitorSettings {
        MonitorSettings {
            hosts: self.hosts.clone(),
            probe_interval: self.probe_interval(),
            report_interval: Duration::from_millis(self.report_interval_ms),
            warmup: Duration::from_millis(self.warmup_ms),
            jitter_window: JitterWindow::from_size(self.jitter_window),
        }
    }
}
