use clap::Parser;
use marker_cluster_lib::ClusterConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Marker Cluster Viewer - Browse large sets of map markers, clustered on a slippy map
pub struct Settings {
    /// GPX files whose waypoints are loaded as markers on startup
    #[clap(short, long, value_name = "FILE")]
    pub markers: Vec<PathBuf>,

    /// Number of generated demo markers shown when no files are loaded
    #[clap(long, default_value = "500")]
    pub demo: usize,

    /// Grid cell size in screen pixels
    #[clap(short, long, default_value = "60.0")]
    pub grid_size: f64,

    /// Smallest member count rendered as a cluster
    #[clap(long, default_value = "2")]
    pub min_cluster_size: usize,

    /// Place clusters at the centroid of their members instead of the first member
    #[clap(long, default_value = "false")]
    pub average_center: bool,

    /// Time the map must stay still before reclustering
    #[clap(long, default_value = "150")]
    pub settle_delay_ms: u64,

    /// Ignore previously persisted state and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

impl Settings {
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig::default()
            .with_grid_size(self.grid_size)
            .with_min_cluster_size(self.min_cluster_size)
            .with_average_center(self.average_center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["marker-cluster-viewer"]).unwrap();
        assert!(settings.markers.is_empty());
        assert_eq!(settings.demo, 500);
        assert_eq!(settings.settle_delay(), Duration::from_millis(150));

        let config = settings.cluster_config();
        assert_eq!(config.grid_size, 60.0);
        assert_eq!(config.min_cluster_size, 2);
        assert!(!config.average_center);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "marker-cluster-viewer",
            "-m",
            "a.gpx",
            "--markers",
            "b.gpx",
            "--grid-size",
            "90",
            "--min-cluster-size",
            "5",
            "--average-center",
        ])
        .unwrap();

        assert_eq!(settings.markers, vec![PathBuf::from("a.gpx"), PathBuf::from("b.gpx")]);
        let config = settings.cluster_config();
        assert_eq!(config.grid_size, 90.0);
        assert_eq!(config.min_cluster_size, 5);
        assert!(config.average_center);
    }
}
