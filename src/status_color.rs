use egui::Color32;

use crate::stats::HostStats;

/// Loss above this share marks a host as poor even when replies are fast.
const POOR_LOSS_PERCENT: f64 = 5.0;

/// Health of one host as shown next to its statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// No probe has completed yet.
    Idle,
    Good,
    Degraded,
    Poor,
    /// Every probe so far was lost.
    Down,
}

impl HostStatus {
    pub fn from_stats(stats: &HostStats, green_threshold: u64, yellow_threshold: u64) -> Self {
        if stats.count == 0 {
            return HostStatus::Idle;
        }
        if stats.success_count == 0 {
            return HostStatus::Down;
        }
        if stats.loss_percent > POOR_LOSS_PERCENT {
            return HostStatus::Poor;
        }

        match stats.average_rtt_ms {
            time if time < green_threshold as f64 && stats.failure_count == 0 => HostStatus::Good,
            time if time < yellow_threshold as f64 => HostStatus::Degraded,
            _ => HostStatus::Poor,
        }
    }

    pub fn to_color32(self) -> Color32 {
        match self {
            HostStatus::Idle => Color32::GRAY,
            HostStatus::Good => Color32::GREEN,
            HostStatus::Degraded => Color32::YELLOW,
            HostStatus::Poor => Color32::from_rgb(255, 165, 0),
            HostStatus::Down => Color32::RED,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HostStatus::Idle => "waiting",
            HostStatus::Good => "good",
            HostStatus::Degraded => "degraded",
            HostStatus::Poor => "poor",
            HostStatus::Down => "down",
        }
    }
}
