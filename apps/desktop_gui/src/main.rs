mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{DesktopGuiApp, StartupConfig};

/// Desktop GUI for the AuraSight retinal screening service.
#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the diagnostics service.
    #[arg(long, env = "AURASIGHT_SERVER_URL", default_value = shared::domain::DEFAULT_SERVER_URL)]
    server_url: String,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let startup = StartupConfig {
        server_url: args.server_url,
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(startup.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AuraSight Diagnostics")
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "AuraSight Diagnostics",
        options,
        Box::new(move |cc| Ok(Box::new(DesktopGuiApp::new(cc, startup, cmd_tx, ui_rx)))),
    )
}
