#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use gantt_timeline::config::TimelineConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting Gantt Timeline");

    let config = TimelineConfig::load_or_default();
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    let path = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Gantt Timeline"),
        ..Default::default()
    };

    eframe::run_native(
        "Gantt Timeline",
        options,
        Box::new(move |cc| Ok(Box::new(app::GanttApp::new(cc, config, runtime, path)))),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
}
