use std::sync::{Arc, Mutex, PoisonError};

use log::info;

use crate::stats::Snapshot;

/// Consumer of the snapshot produced on every report tick.
pub trait Reporter: Send + 'static {
    fn report(&mut self, snapshot: &Snapshot);
}

/// Shared slot holding the most recent snapshot, for front ends that render
/// on their own schedule.
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshot {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Snapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, snapshot: Snapshot) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Reporter for LatestSnapshot {
    fn report(&mut self, snapshot: &Snapshot) {
        self.set(snapshot.clone());
    }
}

/// Logs the run totals at `info` level on every report.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, snapshot: &Snapshot) {
        let global = &snapshot.global;
        info!(
            "Total requests: {} success: {} failures: {} ({:.2}%) elapsed: {}s",
            global.total_requests,
            global.total_success,
            global.total_failures,
            global.total_loss_percent,
            snapshot.elapsed.as_secs()
        );
    }
}

/// Fans one snapshot out to several reporters.
#[derive(Default)]
pub struct Reporters(Vec<Box<dyn Reporter>>);

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: impl Reporter) -> Self {
        self.0.push(Box::new(reporter));
        self
    }
}

impl Reporter for Reporters {
    fn report(&mut self, snapshot: &Snapshot) {
        for reporter in &mut self.0 {
            reporter.report(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_latest_snapshot_keeps_most_recent() {
        let latest = LatestSnapshot::new();
        assert!(latest.get().is_none());

        let mut reporter = latest.clone();
        reporter.report(&Snapshot::from_hosts(Vec::new(), Duration::from_secs(1)));
        reporter.report(&Snapshot::from_hosts(Vec::new(), Duration::from_secs(2)));

        assert_eq!(latest.get().map(|s| s.elapsed), Some(Duration::from_secs(2)));
        latest.clear();
        assert!(latest.get().is_none());
    }

    #[test]
    fn test_reporters_fan_out() {
        let first = LatestSnapshot::new();
        let second = LatestSnapshot::new();
        let mut reporters = Reporters::new()
            .with(first.clone())
            .with(second.clone())
            .with(LogReporter);

        reporters.report(&Snapshot::from_hosts(Vec::new(), Duration::ZERO));

        assert!(first.get().is_some());
        assert!(second.get().is_some());
    }
}
