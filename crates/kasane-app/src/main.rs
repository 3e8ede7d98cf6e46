//! kasane - interactive image pipeline editor.
//!
//! Hosts the fixed `kasane-pipeline` stage chain behind an egui
//! desktop UI: pick a stage on the left, edit its parameters on the
//! right, watch its output in the center. The pipeline is driven once
//! per UI frame; thanks to the dirty-flag contract an idle frame does
//! no pixel work.

mod app;
mod panels;
mod preview;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kasane_app=debug,kasane_pipeline=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting kasane");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("kasane"),
        ..Default::default()
    };

    eframe::run_native(
        "kasane",
        native_options,
        Box::new(|cc| Ok(Box::new(app::KasaneApp::new(cc)))),
    )
}
