use std::io;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use egui::{Color32, RichText};
use log::{error, warn};
use tokio::runtime::Runtime;

use crate::config::{AppConfig, DEFAULT_INTERVAL_MS, parse_interval};
use crate::monitor::Monitor;
use crate::ping_executor::SurgePinger;
use crate::reporter::{LatestSnapshot, LogReporter, Reporters};
use crate::stats::{HostStats, Snapshot};
use crate::status_color::HostStatus;

enum Action {
    Start,
    Stop,
}

pub struct LossMonitorApp {
    config: AppConfig,
    interval_input: String,
    // Dropped before the runtime it spawned its timers on.
    monitor: Option<Monitor>,
    runtime: Runtime,
    latest: LatestSnapshot,
    error: Option<String>,
}

impl LossMonitorApp {
    pub fn new() -> io::Result<Self> {
        let config = AppConfig::load();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            interval_input: config.interval_ms.to_string(),
            config,
            monitor: None,
            runtime,
            latest: LatestSnapshot::new(),
            error: None,
        })
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.as_ref().is_some_and(Monitor::is_running)
    }

    fn start_run(&mut self) {
        self.error = None;

        let interval = parse_interval(&self.interval_input, DEFAULT_INTERVAL_MS);
        let interval_ms = interval.as_millis() as u64;
        self.interval_input = interval_ms.to_string();
        if interval_ms != self.config.interval_ms {
            self.config.interval_ms = interval_ms;
            if let Err(e) = self.config.save() {
                warn!("Failed to save config: {}", e);
            }
        }

        if let Err(e) = self.config.validate() {
            self.error = Some(e.to_string());
            return;
        }

        // The ICMP clients spawn their receive loops on the runtime.
        let _guard = self.runtime.enter();
        let pinger = match SurgePinger::new(self.config.probe_timeout(), self.config.dns_ttl()) {
            Ok(pinger) => pinger,
            Err(e) => {
                error!("Failed to open ICMP socket: {}", e);
                self.error = Some(format!("Cannot open ICMP socket: {e}"));
                return;
            }
        };

        self.latest.clear();
        let reporter = Reporters::new()
            .with(self.latest.clone())
            .with(LogReporter);

        let started = Monitor::new(
            self.runtime.handle().clone(),
            self.config.settings(),
            Arc::new(pinger),
            reporter,
        )
        .and_then(|mut monitor| monitor.start().map(|()| monitor));

        match started {
            Ok(monitor) => self.monitor = Some(monitor),
            Err(e) => {
                error!("Failed to start monitoring: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    fn stop_run(&mut self) {
        if let Some(monitor) = self.monitor.as_mut() {
            self.runtime.block_on(monitor.stop());
            self.latest.set(monitor.snapshot());
        }
    }

    fn draw_header(&self, ui: &mut egui::Ui, snapshot: &Snapshot) {
        let interval_ms = snapshot.probe_interval.as_millis();
        ui.colored_label(
            Color32::from_rgb(204, 153, 0),
            format!(
                "Test timing interval: {} ms ({:.2} s)",
                interval_ms,
                snapshot.probe_interval.as_secs_f64()
            ),
        );
        if let Some(started_at) = snapshot.started_at {
            ui.label(format!("Started: {}", started_at.format("%Y-%m-%d %H:%M:%S")));
        }
    }

    fn draw_hosts(&self, ui: &mut egui::Ui, hosts: &[HostStats]) {
        egui::Grid::new("host_stats")
            .striped(true)
            .num_columns(7)
            .show(ui, |ui| {
                for title in ["Host", "Succ", "Fail", "Avg (ms)", "Loss %", "Jitter (ms)", "Status"] {
                    ui.label(RichText::new(title).strong());
                }
                ui.end_row();

                for host in hosts {
                    let status = HostStatus::from_stats(
                        host,
                        self.config.green_threshold,
                        self.config.yellow_threshold,
                    );
                    ui.label(host.host.as_str());
                    ui.label(host.success_count.to_string());
                    ui.label(host.failure_count.to_string());
                    ui.label(format!("{:.2}", host.average_rtt_ms));
                    ui.label(format!("{:.2}", host.loss_percent));
                    ui.label(format!("{:.2}", host.jitter_ms));
                    ui.colored_label(status.to_color32(), status.label());
                    ui.end_row();
                }
            });
    }

    fn draw_totals(&self, ui: &mut egui::Ui, snapshot: &Snapshot) {
        let global = &snapshot.global;
        ui.colored_label(
            Color32::from_rgb(0, 160, 0),
            format!(
                "Total Requests: {}   Total Success: {}   Total Failures: {} ({:.2}%)",
                global.total_requests,
                global.total_success,
                global.total_failures,
                global.total_loss_percent
            ),
        );
        ui.colored_label(
            Color32::from_rgb(0, 150, 170),
            format!("Elapsed Time: {}", format_elapsed(snapshot.elapsed)),
        );
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs / 60) % 60, secs % 60)
}

impl eframe::App for LossMonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let monitoring = self.is_monitoring();
        let mut action = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Packet Loss Monitor");

            ui.horizontal(|ui| {
                ui.label("Interval (ms):");
                ui.add_enabled(
                    !monitoring,
                    egui::TextEdit::singleline(&mut self.interval_input).desired_width(80.0),
                );
                if ui.button(if monitoring { "Stop" } else { "Start" }).clicked() {
                    action = Some(if monitoring { Action::Stop } else { Action::Start });
                }
            });

            if let Some(error) = &self.error {
                ui.colored_label(Color32::RED, error.as_str());
            }

            ui.separator();

            match self.latest.get() {
                Some(snapshot) => {
                    self.draw_header(ui, &snapshot);
                    ui.add_space(6.0);
                    egui::ScrollArea::vertical()
                        .max_height((ui.available_height() - 60.0).max(100.0))
                        .show(ui, |ui| self.draw_hosts(ui, &snapshot.hosts));
                    ui.add_space(6.0);
                    self.draw_totals(ui, &snapshot);
                }
                None if monitoring => {
                    ui.label("Waiting for the first report...");
                }
                None => {
                    ui.label(format!("{} hosts configured. Press Start.", self.config.hosts.len()));
                }
            }
        });

        match action {
            Some(Action::Start) => self.start_run(),
            Some(Action::Stop) => self.stop_run(),
            None => {}
        }

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
