mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::Result;
use app::LedgerLensApp;
use clap::Parser;
use config::{Cli, DashboardConfig};
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = DashboardConfig::resolve(&cli)?;
    log::debug!("Resolved config: {config:?}");

    let mut state = AppState::new(&config);
    if let Some(path) = &config.data_path {
        // A bad startup file leaves the dashboard empty with the error shown.
        if let Err(e) = state.open(path) {
            log::warn!("{e:#}");
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Ledger Lens – Transactions Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(LedgerLensApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running UI: {e}"))
}
