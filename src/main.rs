#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::error::Error;

use eframe::egui;
use egui::IconData;
use packet_loss_monitor::LossMonitorApp;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let app = LossMonitorApp::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 520.0])
            .with_min_inner_size([480.0, 320.0])
            .with_icon(IconData::default()),
        ..Default::default()
    };
    eframe::run_native(
        "Packet Loss Monitor",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(app))
        }),
    )?;
    Ok(())
}
