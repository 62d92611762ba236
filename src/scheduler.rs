//! Two independent periodic activities: probing and reporting.
//!
//! Each activity runs as its own tokio task around an interval timer. A probe
//! firing spawns the registered probe future and returns to its timer right
//! away, so a slow round never pushes back the next one and rounds may
//! overlap when probes take longer than the interval. The report callback
//! runs inline on the report task.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::SchedulerError;

/// Default report cadence.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Delay before the first probe. Shorter than any report interval in practice,
/// so the first report, one full report period after start, has data.
pub const DEFAULT_WARMUP: Duration = Duration::from_millis(500);

/// tokio intervals reject a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

type ProbeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type ProbeTick = Arc<dyn Fn() -> ProbeFuture + Send + Sync>;
type ReportTick = Box<dyn FnMut() + Send>;

enum State {
    Idle,
    Running(Vec<JoinHandle<()>>),
    Stopped,
}

pub struct Scheduler {
    runtime: Handle,
    probe_interval: Duration,
    report_interval: Duration,
    warmup: Duration,
    on_probe: Option<ProbeTick>,
    on_report: Option<ReportTick>,
    state: State,
}

impl Scheduler {
    pub fn new(runtime: Handle, probe_interval: Duration, report_interval: Duration) -> Self {
        Self {
            runtime,
            probe_interval: clamp_period("probe", probe_interval),
            report_interval: clamp_period("report", report_interval),
            warmup: DEFAULT_WARMUP,
            on_probe: None,
            on_report: None,
            state: State::Idle,
        }
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    pub fn report_interval(&self) -> Duration {
        self.report_interval
    }

    /// Register the probe callback. The future it returns is spawned
    /// detached on every probe tick.
    pub fn on_probe<F, Fut>(&mut self, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_probe = Some(Arc::new(move || -> ProbeFuture { Box::pin(callback()) }));
    }

    /// Register the report callback, run on every report tick.
    pub fn on_report<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_report = Some(Box::new(callback));
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Arm both timers. The probe timer first fires after the warm-up delay,
    /// the report timer after one full report period.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            State::Idle => {}
            State::Running(_) => return Err(SchedulerError::AlreadyStarted),
            State::Stopped => return Err(SchedulerError::Stopped),
        }

        let mut tasks = Vec::with_capacity(2);

        if let Some(mut report) = self.on_report.take() {
            let period = self.report_interval;
            tasks.push(self.runtime.spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    report();
                }
            }));
        }

        if let Some(probe) = self.on_probe.take() {
            let period = self.probe_interval;
            let warmup = self.warmup;
            let runtime = self.runtime.clone();
            tasks.push(self.runtime.spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + warmup, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    runtime.spawn(probe());
                }
            }));
        }

        info!(
            "Scheduler started: probe every {:?} after {:?}, report every {:?}",
            self.probe_interval, self.warmup, self.report_interval
        );
        self.state = State::Running(tasks);
        Ok(())
    }

    /// Disarm both timers. Once this returns no further tick fires; probes
    /// already spawned keep running and still record their results.
    ///
    /// Calling it again, or before `start`, does nothing besides preventing
    /// a later `start`.
    pub async fn stop(&mut self) {
        let State::Running(tasks) = mem::replace(&mut self.state, State::Stopped) else {
            return;
        };

        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            // Aborted tasks resolve with a cancellation error.
            let _ = task.await;
        }
        info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let State::Running(tasks) = &self.state {
            for task in tasks {
                task.abort();
            }
        }
    }
}

fn clamp_period(name: &str, period: Duration) -> Duration {
    if period < MIN_PERIOD {
        warn!("{} interval {:?} is too short, using {:?}", name, period, MIN_PERIOD);
        MIN_PERIOD
    } else {
        period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn count(counter: &Arc<AtomicUsize>) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Probe every 100ms after a 50ms warm-up, report every 200ms.
    fn counting_scheduler(probes: &Arc<AtomicUsize>, reports: &Arc<AtomicUsize>) -> Scheduler {
        let mut scheduler = Scheduler::new(
            Handle::current(),
            Duration::from_millis(100),
            Duration::from_millis(200),
        )
        .with_warmup(Duration::from_millis(50));

        let probes = Arc::clone(probes);
        scheduler.on_probe(move || {
            let probes = Arc::clone(&probes);
            async move {
                probes.fetch_add(1, Ordering::SeqCst);
            }
        });
        let reports = Arc::clone(reports);
        scheduler.on_report(move || {
            reports.fetch_add(1, Ordering::SeqCst);
        });
        scheduler
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_ticks_follow_warmup_and_period() {
        let (probes, reports) = (counter(), counter());
        let mut scheduler = counting_scheduler(&probes, &reports);
        scheduler.start().unwrap();

        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count(&reports), 0);
        assert_eq!(count(&probes), 0);

        // Probes at 50, 150, 250; first report at 200.
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(count(&probes), 3);
        assert_eq!(count(&reports), 1);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_report_sees_a_completed_round() {
        let probes = counter();
        let seen_by_reports = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new(
            Handle::current(),
            Duration::from_millis(1500),
            DEFAULT_REPORT_INTERVAL,
        );
        {
            let probes = Arc::clone(&probes);
            scheduler.on_probe(move || {
                let probes = Arc::clone(&probes);
                async move {
                    probes.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        {
            let (probes, seen) = (Arc::clone(&probes), Arc::clone(&seen_by_reports));
            scheduler.on_report(move || {
                seen.lock().unwrap().push(count(&probes));
            });
        }
        scheduler.start().unwrap();

        time::sleep(Duration::from_millis(4100)).await;
        scheduler.stop().await;

        let seen = seen_by_reports.lock().unwrap().clone();
        assert_eq!(seen.len(), 2, "reports at 2000 and 4000: {seen:?}");
        assert!(seen[0] >= 1, "first report saw no completed round: {seen:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_firing_after_stop() {
        let (probes, reports) = (counter(), counter());
        let mut scheduler = counting_scheduler(&probes, &reports);
        scheduler.start().unwrap();
        assert!(scheduler.is_running());

        time::sleep(Duration::from_millis(430)).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());
        let (probes_at_stop, reports_at_stop) = (count(&probes), count(&reports));
        assert!(probes_at_stop > 0 && reports_at_stop > 0);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count(&probes), probes_at_stop);
        assert_eq!(count(&reports), reports_at_stop);

        // Idempotent.
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_probe_lands_after_stop() {
        let fired = counter();
        let landed = counter();
        let mut scheduler =
            Scheduler::new(Handle::current(), Duration::from_millis(100), Duration::from_secs(2))
                .with_warmup(Duration::from_millis(50));
        {
            let (fired, landed) = (Arc::clone(&fired), Arc::clone(&landed));
            scheduler.on_probe(move || {
                let (fired, landed) = (Arc::clone(&fired), Arc::clone(&landed));
                async move {
                    fired.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(500)).await;
                    landed.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        scheduler.start().unwrap();

        time::sleep(Duration::from_millis(60)).await;
        scheduler.stop().await;
        assert_eq!(count(&fired), 1);
        assert_eq!(count(&landed), 0);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count(&fired), 1);
        assert_eq!(count(&landed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probes_overlap() {
        let in_flight = counter();
        let peak = counter();
        let mut scheduler =
            Scheduler::new(Handle::current(), Duration::from_millis(100), Duration::from_secs(2))
                .with_warmup(Duration::ZERO);
        {
            let (in_flight, peak) = (Arc::clone(&in_flight), Arc::clone(&peak));
            scheduler.on_probe(move || {
                let (in_flight, peak) = (Arc::clone(&in_flight), Arc::clone(&peak));
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    time::sleep(Duration::from_millis(350)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            });
        }
        scheduler.start().unwrap();

        time::sleep(Duration::from_millis(1000)).await;
        scheduler.stop().await;
        assert!(count(&peak) >= 3, "peak overlap was {}", count(&peak));
    }

    #[tokio::test]
    async fn test_start_twice_and_restart_rejected() {
        let mut scheduler =
            Scheduler::new(Handle::current(), Duration::from_secs(1), Duration::from_secs(2));
        scheduler.start().unwrap();
        assert_eq!(scheduler.start(), Err(SchedulerError::AlreadyStarted));

        scheduler.stop().await;
        assert_eq!(scheduler.start(), Err(SchedulerError::Stopped));
    }

    #[tokio::test]
    async fn test_zero_interval_clamped() {
        let scheduler = Scheduler::new(Handle::current(), Duration::ZERO, Duration::ZERO);
        assert_eq!(scheduler.probe_interval(), MIN_PERIOD);
        assert_eq!(scheduler.report_interval(), MIN_PERIOD);
    }
}
