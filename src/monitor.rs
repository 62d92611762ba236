//! One monitoring run: registry, prober and scheduler wired together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::info;
use tokio::runtime::Handle;

use crate::error::MonitorError;
use crate::prober::{Pinger, Prober};
use crate::registry::HostRegistry;
use crate::reporter::Reporter;
use crate::scheduler::{DEFAULT_REPORT_INTERVAL, DEFAULT_WARMUP, Scheduler};
use crate::stats::{JitterWindow, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub hosts: Vec<String>,
    pub probe_interval: Duration,
    pub report_interval: Duration,
    pub warmup: Duration,
    pub jitter_window: JitterWindow,
}

impl MonitorSettings {
    pub fn new<I, S>(hosts: I, probe_interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            probe_interval,
            report_interval: DEFAULT_REPORT_INTERVAL,
            warmup: DEFAULT_WARMUP,
            jitter_window: JitterWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RunClock {
    started: Instant,
    started_at: DateTime<Local>,
}

impl RunClock {
    fn now() -> Self {
        Self {
            started: Instant::now(),
            started_at: Local::now(),
        }
    }
}

pub struct Monitor {
    registry: Arc<HostRegistry>,
    prober: Prober,
    scheduler: Scheduler,
    reporter: Option<Box<dyn Reporter>>,
    jitter_window: JitterWindow,
    probe_interval: Duration,
    clock: Option<RunClock>,
}

impl Monitor {
    /// Build a run over `settings.hosts`. Fails if a host is listed twice.
    pub fn new(
        runtime: Handle,
        settings: MonitorSettings,
        pinger: Arc<dyn Pinger>,
        reporter: impl Reporter,
    ) -> Result<Self, MonitorError> {
        let registry = Arc::new(HostRegistry::from_hosts(settings.hosts)?);
        let prober = Prober::new(Arc::clone(&registry), pinger);
        let scheduler = Scheduler::new(runtime, settings.probe_interval, settings.report_interval)
            .with_warmup(settings.warmup);

        Ok(Self {
            registry,
            prober,
            scheduler,
            reporter: Some(Box::new(reporter)),
            jitter_window: settings.jitter_window,
            probe_interval: settings.probe_interval,
            clock: None,
        })
    }

    pub fn start(&mut self) -> Result<(), MonitorError> {
        let clock = RunClock::now();

        let prober = self.prober.clone();
        self.scheduler.on_probe(move || {
            let prober = prober.clone();
            async move { prober.probe_once().await }
        });

        if let Some(mut reporter) = self.reporter.take() {
            let registry = Arc::clone(&self.registry);
            let window = self.jitter_window;
            let interval = self.probe_interval;
            self.scheduler.on_report(move || {
                let snapshot = capture(&registry, clock, window, interval);
                reporter.report(&snapshot);
            });
        }

        self.scheduler.start()?;
        self.clock = Some(clock);
        info!(
            "Monitoring {} hosts every {:?}",
            self.registry.len(),
            self.probe_interval
        );
        Ok(())
    }

    /// Stop probing and reporting. Probes already in flight still land in
    /// the registry afterwards.
    pub async fn stop(&mut self) {
        self.scheduler.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Statistics as of now, e.g. for a final report after `stop`.
    pub fn snapshot(&self) -> Snapshot {
        let clock = self.clock.unwrap_or_else(RunClock::now);
        capture(&self.registry, clock, self.jitter_window, self.probe_interval)
    }

    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }
}

fn capture(
    registry: &HostRegistry,
    clock: RunClock,
    window: JitterWindow,
    interval: Duration,
) -> Snapshot {
    Snapshot::capture(registry, clock.started, window)
        .with_started_at(clock.started_at)
        .with_probe_interval(interval)
}
