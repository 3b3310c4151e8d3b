//! Walkers plugin for integrating marker clustering with the map view
//!
//! Each frame the plugin reports the viewport to the map host, lets the engine recluster
//! once the map has settled, draws visible markers and cluster icons, and zooms into a
//! cluster when it is clicked.

use crate::app::host::WalkersHost;
use crate::app::state::Engine;
use egui::{Align2, Color32, FontId, Pos2, Stroke};
use geo::{Coord, Point};
use marker_cluster_lib::utils::lat_lng;
use marker_cluster_lib::{ClusterMarker, LeafMarker, PassOutcome, ViewportSnapshot};
use std::sync::Arc;
use tokio::sync::RwLock;
use walkers::{MapMemory, Plugin, Projector};

const MARKER_RADIUS: f32 = 5.0;
const MARKER_COLOR: Color32 = Color32::from_rgb(220, 60, 60);
const LABEL_DISTANCE: f32 = 8.0;

/// Plugin for rendering clustered markers on the map
pub struct ClusterPlugin {
    engine: Arc<RwLock<Engine>>,
    host: WalkersHost,
}

impl ClusterPlugin {
    pub fn new(engine: Arc<RwLock<Engine>>, host: WalkersHost) -> Self {
        Self { engine, host }
    }
}

fn to_screen(projector: &Projector, point: Point<f64>) -> Pos2 {
    let screen_vec = projector.project(walkers::lat_lon(point.y(), point.x()));
    Pos2::new(screen_vec.x, screen_vec.y)
}

fn to_coord(pos: Pos2) -> Coord<f64> {
    Coord {
        x: pos.x as f64,
        y: pos.y as f64,
    }
}

fn render_cluster(cluster: &ClusterMarker, screen_center: Pos2, hovered: bool, painter: &egui::Painter) {
    let icon = cluster.icon();
    let [r, g, b, a] = icon.color;
    let radius = icon.size[0].min(icon.size[1]) / 2.0;
    // The anchor pixel of the icon sits on the cluster center
    let icon_center = screen_center + egui::vec2(icon.size[0] / 2.0 - icon.anchor[0], icon.size[1] / 2.0 - icon.anchor[1]);

    let fill = Color32::from_rgba_unmultiplied(r, g, b, a);
    painter.circle_filled(icon_center, radius, fill.gamma_multiply(0.35));
    painter.circle_filled(icon_center, radius * 0.7, fill);
    if hovered {
        painter.circle_stroke(icon_center, radius, Stroke::new(2.0, Color32::WHITE));
    }
    painter.text(
        icon_center,
        Align2::CENTER_CENTER,
        &icon.label,
        FontId::proportional(13.0),
        Color32::BLACK,
    );
}

impl Plugin for ClusterPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        map_memory: &MapMemory,
    ) {
        profiling::scope!("ClusterPlugin::run");

        // Report the viewport of this frame, relative to the map's top left corner
        let viewport_rect = response.rect;
        let center = projector.unproject(viewport_rect.center().to_vec2());
        let snapshot = ViewportSnapshot {
            center: lat_lng(center.y(), center.x()),
            zoom: map_memory.zoom(),
            width: viewport_rect.width() as f64,
            height: viewport_rect.height() as f64,
        };
        let interacting = response.dragged() || ui.input(|i| i.pointer.any_down());
        self.host.observe(snapshot, interacting);

        // Use try_write for non-blocking UI polling.
        let Ok(mut engine) = self.engine.try_write() else {
            return;
        };
        match engine.poll_viewport().map(PassOutcome::into_result) {
            Some(Ok(summary)) => tracing::trace!(?summary, "Reclustered after settle"),
            Some(Err(reason)) => tracing::trace!("Recluster after settle skipped: {reason}"),
            None => {}
        }

        let painter = ui.painter();
        let pointer = response.hover_pos();

        {
            profiling::scope!("render_markers");
            for marker in engine.markers().iter().filter(|m| m.is_visible()) {
                let pos = to_screen(projector, marker.position());
                if !viewport_rect.expand(MARKER_RADIUS).contains(pos) {
                    continue;
                }
                painter.circle_filled(pos, MARKER_RADIUS, MARKER_COLOR);
                painter.circle_stroke(pos, MARKER_RADIUS, Stroke::new(1.5, Color32::WHITE));

                if pointer.is_some_and(|p| p.distance(pos) <= LABEL_DISTANCE) {
                    painter.text(
                        pos + egui::vec2(0.0, -MARKER_RADIUS - 2.0),
                        Align2::CENTER_BOTTOM,
                        &marker.payload().name,
                        FontId::proportional(13.0),
                        ui.visuals().strong_text_color(),
                    );
                }
            }
        }

        let mut hovered_cluster = None;
        {
            profiling::scope!("render_clusters");
            for cluster in engine.clusters() {
                let screen_center = to_screen(projector, cluster.center());
                let hovered = pointer.is_some_and(|p| cluster.contains(to_coord(screen_center), to_coord(p)));
                if hovered {
                    hovered_cluster = Some(cluster.id());
                }
                render_cluster(cluster, screen_center, hovered, painter);
            }
        }

        if let Some(id) = hovered_cluster {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            if response.clicked() {
                engine.zoom_to_cluster(id);
            }
        }
    }
}
