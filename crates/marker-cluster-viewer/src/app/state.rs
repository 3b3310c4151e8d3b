//! Application state management
//!
//! This module owns the clustering engine and the map host it is attached to, together
//! with the UI settings, file loading and statistics shown in the sidebar.

use crate::app::host::WalkersHost;
use crate::app::places::{self, LoadError, PlaceMarker};
use crate::app::settings::Settings;
use geo::{BoundingRect, MultiPoint, Rect};
use marker_cluster_lib::{ClusterConfig, ClusterEngine, LeafMarker, PassSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type Engine = ClusterEngine<WalkersHost, PlaceMarker>;

/// Where demo markers are generated when nothing else is loaded (Madrid)
pub const DEMO_CENTER: (f64, f64) = (40.4168, -3.7038);

/// Main application state
pub struct AppState {
    /// Clustering engine, shared with the map plugin
    pub engine: Arc<RwLock<Engine>>,

    /// The map the engine is attached to
    pub host: WalkersHost,

    /// Current UI settings
    pub ui_settings: UiSettings,

    /// File loading state
    pub file_loader: FileLoader,

    /// Statistics about markers and the last clustering pass
    pub stats: Stats,

    /// Whether the map should be fitted to the markers on the next frame
    pub pending_fit_bounds: bool,

    next_marker_id: u64,
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone, Debug, PartialEq)]
pub struct UiSettings {
    pub grid_size: f64,
    pub min_cluster_size: usize,
    pub average_center: bool,

    /// Whether the engine is attached to the map
    pub attached: bool,

    /// Whether sidebar is open
    pub sidebar_open: bool,
}

impl UiSettings {
    pub fn from_cli(settings: &Settings) -> Self {
        Self {
            grid_size: settings.grid_size,
            min_cluster_size: settings.min_cluster_size,
            average_center: settings.average_center,
            attached: true,
            sidebar_open: true,
        }
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig::default()
            .with_grid_size(self.grid_size)
            .with_min_cluster_size(self.min_cluster_size)
            .with_average_center(self.average_center)
    }
}

/// File loading state and operations
#[derive(Default)]
pub struct FileLoader {
    /// Files pending load
    pub pending_files: Vec<PathBuf>,

    /// Load errors
    pub errors: Vec<(PathBuf, String)>,

    /// Successfully loaded files with their marker count
    pub loaded_files: Vec<(PathBuf, usize)>,

    /// Show file picker dialog
    pub show_picker: bool,
}

impl FileLoader {
    /// Check if any files are waiting to be loaded
    pub fn is_busy(&self) -> bool {
        !self.pending_files.is_empty()
    }
}

/// Statistics about loaded markers and clustering
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Stats {
    pub markers: usize,
    pub attached: bool,
    pub last_pass: Option<PassSummary>,
}

impl AppState {
    /// Create the state, loading `files` or, without any, `settings.demo` generated markers
    pub fn new(settings: &Settings, ui_settings: UiSettings, files: Vec<PathBuf>) -> Self {
        let host = WalkersHost::new(settings.settle_delay());
        let engine = ClusterEngine::new(Vec::new(), ui_settings.cluster_config());

        let mut state = Self {
            engine: Arc::new(RwLock::new(engine)),
            host,
            ui_settings,
            file_loader: FileLoader::default(),
            stats: Stats::default(),
            pending_fit_bounds: false,
            next_marker_id: 0,
        };

        if files.is_empty() && settings.demo > 0 {
            state.load_demo(settings.demo);
        }
        for file in files {
            state.queue_file(file);
        }

        let attached = state.ui_settings.attached;
        state.set_attached(attached);
        state
    }

    /// Run `f` on the engine if the map plugin is not holding it
    fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> Option<R> {
        match self.engine.try_write() {
            Ok(mut engine) => Some(f(&mut engine)),
            Err(_) => {
                tracing::warn!("Cluster engine busy, skipping update");
                None
            }
        }
    }

    /// Push the clustering sliders into the engine
    pub fn apply_cluster_settings(&mut self) {
        let config = self.ui_settings.cluster_config();
        tracing::debug!(?config, "Applying cluster settings");
        self.with_engine(|engine| engine.set_config(config));
        self.update_stats();
    }

    /// Attach the engine to the map, or detach it and show every marker again
    pub fn set_attached(&mut self, attached: bool) {
        self.ui_settings.attached = attached;
        let host = self.host.clone();
        self.with_engine(|engine| {
            if attached {
                engine.set_map(Some(host));
            } else {
                engine.set_map(None);
                for marker in engine.markers() {
                    marker.set_visible(true);
                }
            }
        });
        self.update_stats();
    }

    fn append_markers(&mut self, new_markers: Vec<PlaceMarker>) -> usize {
        let added = new_markers.len();
        self.next_marker_id += added as u64;
        self.with_engine(|engine| {
            let mut markers = engine.markers().to_vec();
            markers.extend(new_markers);
            engine.set_markers(markers);
        });
        self.pending_fit_bounds = true;
        self.update_stats();
        added
    }

    /// Add generated demo markers
    pub fn load_demo(&mut self, count: usize) {
        let (lat, lng) = DEMO_CENTER;
        let markers = places::demo_places(count, lat, lng, self.next_marker_id);
        tracing::info!("Generated {count} demo markers");
        self.append_markers(markers);
    }

    /// Load the waypoints of a GPX file as markers
    pub fn load_gpx_file(&mut self, path: PathBuf) -> Result<usize, LoadError> {
        profiling::scope!("load_gpx_file");

        match places::load_gpx_places(&path, self.next_marker_id) {
            Ok(markers) => {
                let added = self.append_markers(markers);
                tracing::info!("Loaded {added} markers from {}", path.display());
                self.file_loader.loaded_files.push((path, added));
                Ok(added)
            }
            Err(e) => {
                tracing::warn!("Failed to load {}: {e}", path.display());
                self.file_loader.errors.push((path, e.to_string()));
                Err(e)
            }
        }
    }

    /// Load the next queued file, if any
    pub fn process_pending_files(&mut self) {
        if let Some(path) = self.file_loader.pending_files.pop() {
            let _ = self.load_gpx_file(path);
        }
    }

    /// Add a file to the pending load queue
    pub fn queue_file(&mut self, path: PathBuf) {
        let already_loaded = self
            .file_loader
            .loaded_files
            .iter()
            .any(|(p, _)| p == &path);
        if !self.file_loader.pending_files.contains(&path) && !already_loaded {
            self.file_loader.pending_files.push(path);
        }
    }

    /// Remove every marker and forget the loaded files
    pub fn clear_markers(&mut self) {
        self.with_engine(|engine| engine.set_markers(Vec::new()));
        self.file_loader.loaded_files.clear();
        self.file_loader.errors.clear();
        self.file_loader.pending_files.clear();
        self.update_stats();
    }

    /// Geographic bounds of all markers (x = longitude, y = latitude)
    pub fn marker_bounds(&self) -> Option<Rect<f64>> {
        let engine = self.engine.try_read().ok()?;
        let points: MultiPoint<f64> = engine.markers().iter().map(LeafMarker::position).collect();
        points.bounding_rect()
    }

    /// Update statistics from the engine
    pub fn update_stats(&mut self) {
        // Use try_read for non-blocking UI polling.
        if let Ok(engine) = self.engine.try_read() {
            self.stats = Stats {
                markers: engine.markers().len(),
                attached: engine.map().is_some(),
                last_pass: engine.last_summary(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use marker_cluster_lib::ViewportSnapshot;
    use marker_cluster_lib::utils::lat_lng;

    fn settings(args: &[&str]) -> Settings {
        let mut argv = vec!["marker-cluster-viewer", "--settle-delay-ms", "0"];
        argv.extend_from_slice(args);
        Settings::try_parse_from(argv).unwrap()
    }

    fn state_with_demo(count: usize) -> AppState {
        let settings = settings(&["--demo", &count.to_string()]);
        AppState::new(&settings, UiSettings::from_cli(&settings), Vec::new())
    }

    /// Show the map over the demo area at `zoom` and let it settle
    fn settle_map(state: &AppState, zoom: f64) {
        let snapshot = ViewportSnapshot {
            center: lat_lng(DEMO_CENTER.0, DEMO_CENTER.1),
            zoom,
            width: 1280.0,
            height: 720.0,
        };
        state.host.observe(snapshot, false);
        assert!(state.host.observe(snapshot, false));
        state.engine.try_write().unwrap().poll_viewport();
    }

    #[test]
    fn test_demo_markers_loaded_when_no_files() {
        let mut state = state_with_demo(120);
        state.update_stats();

        assert_eq!(state.stats.markers, 120);
        assert!(state.stats.attached);
        assert!(state.pending_fit_bounds);
        // No frame drawn yet, so no projection and no pass
        assert_eq!(state.stats.last_pass, None);
    }

    #[test]
    fn test_files_replace_demo() {
        let settings = settings(&["--demo", "50"]);
        let state = AppState::new(
            &settings,
            UiSettings::from_cli(&settings),
            vec![PathBuf::from("places.gpx")],
        );

        assert_eq!(state.file_loader.pending_files, vec![PathBuf::from("places.gpx")]);
        assert!(state.engine.try_read().unwrap().markers().is_empty());
    }

    #[test]
    fn test_settle_clusters_demo() {
        let mut state = state_with_demo(300);
        settle_map(&state, 8.0);
        state.update_stats();

        let summary = state.stats.last_pass.expect("pass ran after settle");
        assert!(summary.clusters > 0);
        assert_eq!(summary.clustered_markers + summary.singletons, 300);
    }

    #[test]
    fn test_detach_restores_visibility() {
        let mut state = state_with_demo(300);
        settle_map(&state, 8.0);
        assert!(
            state
                .engine
                .try_read()
                .unwrap()
                .markers()
                .iter()
                .any(|m| !m.is_visible())
        );

        state.set_attached(false);

        let engine = state.engine.try_read().unwrap();
        assert!(engine.clusters().is_empty());
        assert!(engine.markers().iter().all(|m| m.is_visible()));
        drop(engine);
        assert!(!state.stats.attached);
    }

    #[test]
    fn test_cluster_settings_applied() {
        let mut state = state_with_demo(300);
        settle_map(&state, 8.0);

        state.ui_settings.min_cluster_size = 1000;
        state.apply_cluster_settings();

        let summary = state.stats.last_pass.unwrap();
        assert_eq!(summary.clusters, 0);
        assert_eq!(summary.singletons, 300);
    }

    #[test]
    fn test_load_gpx_file() {
        let path = std::env::temp_dir().join(format!("marker-cluster-viewer-{}.gpx", std::process::id()));
        std::fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="40.41" lon="-3.70"><name>Sol</name></wpt>
  <wpt lat="40.42" lon="-3.69"><name>Retiro</name></wpt>
</gpx>"#,
        )
        .unwrap();

        let mut state = state_with_demo(10);
        assert_eq!(state.load_gpx_file(path.clone()).unwrap(), 2);
        assert_eq!(state.stats.markers, 12);
        assert_eq!(state.file_loader.loaded_files, vec![(path.clone(), 2)]);

        // Ids keep counting after the demo markers
        let engine = state.engine.try_read().unwrap();
        assert_eq!(engine.markers()[10].id().0, 10);
        drop(engine);

        state.queue_file(path.clone());
        assert!(state.file_loader.pending_files.is_empty());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_failed_load_is_recorded() {
        let mut state = state_with_demo(0);
        state.queue_file(PathBuf::from("/no/such/file.gpx"));
        state.process_pending_files();

        assert!(!state.file_loader.is_busy());
        assert_eq!(state.file_loader.errors.len(), 1);
        assert_eq!(state.stats.markers, 0);
    }

    #[test]
    fn test_clear_and_bounds() {
        let mut state = state_with_demo(50);
        let bounds = state.marker_bounds().unwrap();
        assert!(bounds.min().y < DEMO_CENTER.0 && bounds.max().y > DEMO_CENTER.0);

        state.clear_markers();
        assert_eq!(state.stats.markers, 0);
        assert!(state.marker_bounds().is_none());
    }
}
