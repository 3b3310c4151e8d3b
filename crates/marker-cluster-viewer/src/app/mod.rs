//! Application module
//!
//! This module provides the main application structure:
//! - Full-screen map view with clustered markers
//! - Toggleable sidebar with clustering controls and statistics
//! - Drag-and-drop support for GPX files
//! - Persistence of settings, loaded files and the last view

mod host;
mod places;
mod plugin;
pub(crate) mod settings;
mod state;
mod ui_panels;

use crate::app::plugin::ClusterPlugin;
use crate::app::settings::Settings;
use crate::app::state::{AppState, UiSettings};
use eframe::egui;
use marker_cluster_lib::ViewportSnapshot;
use std::collections::HashSet;
use std::path::PathBuf;
use walkers::{HttpTiles, Map, MapMemory, sources::OpenStreetMap};

const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Persisted settings (lightweight, no marker data)
#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedSettings {
    grid_size: f64,
    min_cluster_size: usize,
    average_center: bool,
    attached: bool,
    sidebar_open: bool,
    /// File paths that were loaded (will need to be reloaded)
    loaded_file_paths: Vec<String>,
    /// Last map view
    view: Option<ViewportSnapshot>,
}

/// Main application structure
pub struct MarkerClusterViewerApp {
    /// Application state (engine, UI settings, etc.)
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles: HttpTiles,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,

    /// Show help overlay
    show_help: bool,
}

impl MarkerClusterViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let cli_args = Settings::from_cli();

        let persisted = if cli_args.ignore_persisted {
            tracing::info!("Ignoring persisted state (--ignore-persisted flag)");
            None
        } else {
            cc.storage.and_then(Self::load_persisted_settings)
        };

        let mut map_memory = MapMemory::default();
        let state = match persisted {
            Some(persisted) => {
                let view = persisted.view;
                let mut state = Self::state_from_persisted_settings(persisted, &cli_args);
                if let Some(view) = view {
                    map_memory.center_at(walkers::lat_lon(view.center.y(), view.center.x()));
                    let _ = map_memory.set_zoom(view.zoom);
                    // The restored view wins over fitting the demo markers
                    state.pending_fit_bounds = false;
                }
                state
            }
            None => AppState::new(&cli_args, UiSettings::from_cli(&cli_args), cli_args.markers.clone()),
        };

        tracing::info!(
            "Initialized with {} files to load",
            state.file_loader.pending_files.len()
        );

        Self {
            state,
            tiles: HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone()),
            map_memory,
            show_help: false,
        }
    }

    /// Load persisted settings from storage (fast, no marker data)
    fn load_persisted_settings(storage: &dyn eframe::Storage) -> Option<PersistedSettings> {
        if let Some(json) = storage.get_string("persisted_settings")
            && !json.is_empty()
        {
            match serde_json::from_str::<PersistedSettings>(&json) {
                Ok(settings) => {
                    tracing::info!("Restored settings, will reload files");
                    return Some(settings);
                }
                Err(e) => tracing::warn!("Discarding unreadable persisted settings: {e}"),
            }
        }

        tracing::info!("No persisted settings found, starting fresh");
        None
    }

    /// Create AppState from persisted settings, queuing persisted and CLI files
    fn state_from_persisted_settings(settings: PersistedSettings, cli_args: &Settings) -> AppState {
        let ui_settings = UiSettings {
            grid_size: settings.grid_size,
            min_cluster_size: settings.min_cluster_size,
            average_center: settings.average_center,
            attached: settings.attached,
            sidebar_open: settings.sidebar_open,
        };

        // Deduplicate by canonical path regardless of relative/absolute paths
        let mut files: Vec<PathBuf> = Vec::new();
        let mut seen_paths: HashSet<PathBuf> = HashSet::new();
        let persisted = settings.loaded_file_paths.iter().map(PathBuf::from);
        for path in persisted.chain(cli_args.markers.iter().cloned()) {
            if path.exists() {
                let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                if seen_paths.insert(canonical) {
                    files.push(path);
                }
            }
        }

        AppState::new(cli_args, ui_settings, files)
    }

    /// Fit the map view to the bounding box of all markers
    fn fit_to_bounds(&mut self) {
        let Some(bounds) = self.state.marker_bounds() else {
            return;
        };

        let center = bounds.center();
        let max_span = bounds.width().max(bounds.height());
        let zoom = if max_span > 0.0 {
            let zoom_estimate = (4.0 * 360.0 / max_span).log2();
            (zoom_estimate - 0.5).clamp(1.0, 18.0)
        } else {
            12.0
        };

        self.map_memory.center_at(walkers::lat_lon(center.y, center.x));
        let _ = self.map_memory.set_zoom(zoom);

        tracing::trace!(
            "Auto-zoomed to markers: ({:.4}, {:.4}) - ({:.4}, {:.4}), zoom: {:.1}",
            bounds.min().y,
            bounds.min().x,
            bounds.max().y,
            bounds.max().x,
            zoom
        );
    }
}

#[profiling::all_functions]
impl eframe::App for MarkerClusterViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle keyboard shortcuts
        ctx.input(|i| {
            if i.key_pressed(egui::Key::F1) || (i.key_pressed(egui::Key::H) && i.modifiers.ctrl) {
                self.show_help = !self.show_help;
            }
        });

        // Auto-zoom to fit loaded markers if requested
        if self.state.pending_fit_bounds {
            self.state.pending_fit_bounds = false;
            self.fit_to_bounds();
        }

        ui_panels::handle_drag_and_drop(ctx, &mut self.state);
        ui_panels::show_file_picker(&mut self.state);

        if self.show_help {
            ui_panels::help_overlay(ctx, &mut self.show_help);
        }

        ui_panels::render_sidebar(ctx, &mut self.state);

        let cluster_plugin = ClusterPlugin::new(self.state.engine.clone(), self.state.host.clone());

        // Central panel: Map view (full screen)
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let map = Map::new(
                    Some(&mut self.tiles),
                    &mut self.map_memory,
                    walkers::lat_lon(0.0, 0.0),
                )
                .with_plugin(cluster_plugin);
                ui.add(map);

                ui_panels::sidebar_toggle_button(ui, &mut self.state);

                let screen_rect = ui.max_rect();
                ui.painter().text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    ATTRIBUTION,
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            });

        // Zoom requests from clicked clusters take effect on the next frame
        if self.state.host.has_pending_view_change() {
            self.state.host.apply_pending(&mut self.map_memory);
            ctx.request_repaint();
        }

        self.state.update_stats();

        // Keep frames coming until the map settles, or the recluster would wait for input
        if self.state.host.is_settling() {
            ctx.request_repaint_after(self.state.host.settle_delay());
        }

        // Load queued files one at a time for UI responsiveness
        if self.state.file_loader.is_busy() {
            self.state.process_pending_files();
            ctx.request_repaint();
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        // Include pending files so that closing during loading loses nothing
        let mut loaded_file_paths: Vec<String> = self
            .state
            .file_loader
            .loaded_files
            .iter()
            .map(|(path, _)| path.to_string_lossy().to_string())
            .collect();
        for path in &self.state.file_loader.pending_files {
            let path_str = path.to_string_lossy().to_string();
            if !loaded_file_paths.contains(&path_str) {
                loaded_file_paths.push(path_str);
            }
        }

        let ui = &self.state.ui_settings;
        let settings = PersistedSettings {
            grid_size: ui.grid_size,
            min_cluster_size: ui.min_cluster_size,
            average_center: ui.average_center,
            attached: ui.attached,
            sidebar_open: ui.sidebar_open,
            loaded_file_paths,
            view: self.state.host.viewport(),
        };

        match serde_json::to_string(&settings) {
            Ok(json) => {
                storage.set_string("persisted_settings", json);
                tracing::debug!("Saved settings on exit");
            }
            Err(e) => tracing::warn!("Failed to save settings: {e}"),
        }
    }
}
