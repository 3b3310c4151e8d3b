//! UI panels for the application
//!
//! This module provides the sidebar with clustering controls, marker sources and
//! statistics, plus the help overlay and drag-and-drop support.

use crate::app::state::AppState;
use egui::{Color32, RichText, Ui};

/// Render the sidebar toggle button (overlaid on top-right of map)
pub fn sidebar_toggle_button(ui: &mut Ui, state: &mut AppState) {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_pos = rect.right_top() + egui::vec2(-button_size.x - margin, margin);
    let button_rect = egui::Rect::from_min_size(button_pos, button_size);

    let response = ui.allocate_rect(button_rect, egui::Sense::click());
    if response.clicked() {
        state.ui_settings.sidebar_open = !state.ui_settings.sidebar_open;
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };
    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if state.ui_settings.sidebar_open {
        "✕"
    } else {
        "☰"
    };
    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );
}

/// Render the main sidebar
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    egui::SidePanel::right("main_sidebar")
        .default_width(300.0)
        .min_width(260.0)
        .max_width(450.0)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    render_clustering_section(ui, state);
                    ui.add_space(12.0);
                    ui.separator();
                    render_markers_section(ui, state);
                    ui.add_space(12.0);
                    ui.separator();
                    render_stats_section(ui, state);
                });
        });
}

/// Clustering controls
fn render_clustering_section(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("🔵 Clustering").strong());
    ui.add_space(6.0);

    let mut attached = state.ui_settings.attached;
    if ui
        .checkbox(&mut attached, "Cluster markers")
        .on_hover_text("Detach to show every marker individually")
        .changed()
    {
        state.set_attached(attached);
    }
    ui.add_space(4.0);

    let mut changed = false;
    ui.add_enabled_ui(state.ui_settings.attached, |ui| {
        egui::Grid::new("clustering_grid")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Grid Size:");
                changed |= ui
                    .add(
                        egui::Slider::new(&mut state.ui_settings.grid_size, 10.0..=200.0)
                            .suffix(" px")
                            .step_by(5.0),
                    )
                    .changed();
                ui.end_row();

                ui.label("Min Cluster Size:");
                changed |= ui
                    .add(egui::Slider::new(&mut state.ui_settings.min_cluster_size, 1..=20))
                    .changed();
                ui.end_row();

                ui.label("Center:");
                changed |= ui
                    .checkbox(&mut state.ui_settings.average_center, "Average of members")
                    .changed();
                ui.end_row();
            });
    });

    if changed {
        state.apply_cluster_settings();
    }

    ui.add_space(4.0);
    ui.label(
        RichText::new("Click a cluster to zoom into it")
            .small()
            .weak(),
    );
}

/// Marker sources and loaded files
fn render_markers_section(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("📍 Markers").strong());
    ui.add_space(6.0);

    ui.horizontal(|ui| {
        if ui.button("📂 Load GPX Files...").clicked() {
            state.file_loader.show_picker = true;
        }
        if ui.button("🎲 Add Demo").clicked() {
            state.load_demo(500);
        }
    });
    ui.horizontal(|ui| {
        if ui.button("🎯 Fit to Markers").clicked() {
            state.pending_fit_bounds = true;
        }
        if ui.button("🗑 Clear All").clicked() {
            state.clear_markers();
        }
    });

    if state.file_loader.is_busy() {
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!(
                "⏳ Loading files... ({} left)",
                state.file_loader.pending_files.len()
            ))
            .strong()
            .color(ui.visuals().warn_fg_color),
        );
    }

    if !state.file_loader.errors.is_empty() {
        ui.add_space(8.0);
        ui.label(
            RichText::new(format!(
                "⚠ Errors ({} files)",
                state.file_loader.errors.len()
            ))
            .strong()
            .color(Color32::RED),
        );

        egui::ScrollArea::vertical()
            .id_salt("errors_scroll")
            .max_height(100.0)
            .show(ui, |ui| {
                for (file, error) in &state.file_loader.errors {
                    ui.label(
                        RichText::new(format!(
                            "• {}: {}",
                            file.file_name().unwrap_or_default().to_string_lossy(),
                            error
                        ))
                        .small()
                        .color(Color32::RED),
                    );
                }
            });

        if ui.button("Clear Errors").clicked() {
            state.file_loader.errors.clear();
        }
    }

    if !state.file_loader.loaded_files.is_empty() {
        ui.add_space(8.0);
        ui.label(
            RichText::new("✓ Loaded Files")
                .strong()
                .color(Color32::GREEN),
        );

        egui::ScrollArea::vertical()
            .id_salt("loaded_files_scroll")
            .max_height(160.0)
            .show(ui, |ui| {
                for (path, count) in &state.file_loader.loaded_files {
                    ui.label(
                        RichText::new(format!(
                            "📄 {} ({count} markers)",
                            path.file_name().unwrap_or_default().to_string_lossy()
                        ))
                        .small(),
                    );
                }
            });
    }
}

/// Statistics of the loaded markers and the last clustering pass
fn render_stats_section(ui: &mut Ui, state: &AppState) {
    ui.label(RichText::new("📊 Statistics").strong());
    ui.add_space(4.0);

    egui::Grid::new("stats_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Markers:");
            ui.label(RichText::new(format!("{}", state.stats.markers)).strong());
            ui.end_row();

            let Some(summary) = state.stats.last_pass.filter(|_| state.stats.attached) else {
                ui.label("Clusters:");
                ui.label(RichText::new("-").weak());
                ui.end_row();
                return;
            };

            ui.label("Occupied Cells:");
            ui.label(RichText::new(format!("{}", summary.cells)).strong());
            ui.end_row();

            ui.label("Clusters:");
            ui.label(RichText::new(format!("{}", summary.clusters)).strong());
            ui.end_row();

            ui.label("Clustered Markers:");
            ui.label(RichText::new(format!("{}", summary.clustered_markers)).strong());
            ui.end_row();

            ui.label("Single Markers:");
            ui.label(RichText::new(format!("{}", summary.singletons)).strong());
            ui.end_row();

            if summary.skipped_clusters > 0 {
                ui.label("Not Rendered:");
                ui.label(
                    RichText::new(format!("{}", summary.skipped_clusters)).color(Color32::RED),
                );
                ui.end_row();
            }
        });
}

/// Show file picker dialog
#[cfg(not(any(target_arch = "wasm32", target_os = "android")))]
pub fn show_file_picker(state: &mut AppState) {
    if state.file_loader.show_picker {
        state.file_loader.show_picker = false;

        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("GPX Files", &["gpx"])
            .set_title("Select GPX Files")
            .pick_files()
        {
            for path in paths {
                state.queue_file(path);
            }
        }
    }
}

#[cfg(any(target_arch = "wasm32", target_os = "android"))]
pub fn show_file_picker(state: &mut AppState) {
    state.file_loader.show_picker = false;
}

/// Help overlay
pub fn help_overlay(ctx: &egui::Context, show_help: &mut bool) {
    egui::Window::new("Help")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.heading("Marker Cluster Viewer");
            ui.add_space(8.0);

            ui.label("Nearby markers are grouped into clusters whenever the map comes to rest.");
            ui.add_space(12.0);

            ui.label(RichText::new("Loading Markers").strong());
            ui.label("• Click 'Load GPX Files...' in the sidebar");
            ui.label("• Or drag and drop GPX files onto the window");
            ui.label("• Every waypoint becomes a marker");
            ui.add_space(8.0);

            ui.label(RichText::new("Navigation").strong());
            ui.label("• Scroll wheel to zoom, click and drag to pan");
            ui.label("• Click a cluster to zoom into it");
            ui.label("• Hover a marker to see its name");
            ui.add_space(8.0);

            ui.label(RichText::new("Keyboard Shortcuts").strong());
            ui.label("• F1 or Ctrl+H - Toggle this help");
            ui.add_space(12.0);

            if ui.button("Close").clicked() {
                *show_help = false;
            }
        });
}

/// Handle drag and drop of GPX files
pub fn handle_drag_and_drop(ctx: &egui::Context, state: &mut AppState) {
    let hovered_files = ctx.input(|i| !i.raw.hovered_files.is_empty());
    let dropped_files: Vec<_> = ctx.input(|i| i.raw.dropped_files.clone());

    if hovered_files {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drop_preview"),
        ));
        let screen_rect = ctx.content_rect();
        let bg_rect = egui::Rect::from_center_size(screen_rect.center(), egui::vec2(340.0, 80.0));
        painter.rect_filled(bg_rect, 16.0, Color32::from_black_alpha(180));
        painter.text(
            screen_rect.center(),
            egui::Align2::CENTER_CENTER,
            "📂 Drop GPX files here",
            egui::FontId::proportional(32.0),
            Color32::WHITE,
        );
    }

    for path in dropped_files.into_iter().filter_map(|file| file.path) {
        if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("gpx")) {
            state.queue_file(path);
        } else {
            tracing::debug!("Ignoring dropped file {}", path.display());
        }
    }
}
