//! Marker Cluster Viewer - Application Library
//!
//! Hosts the clustering engine on a `walkers` slippy map: markers come from GPX waypoint
//! files (or a generated demo set), are clustered whenever the map comes to rest, and
//! clusters zoom in on click.

mod app;

pub use app::MarkerClusterViewerApp;

use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "Marker Cluster Viewer";

/// Native entry point
pub fn native_main() -> eframe::Result {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting {APP_NAME} v{}", env!("CARGO_PKG_VERSION"));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(APP_NAME),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(MarkerClusterViewerApp::new(cc)))),
    )
}
