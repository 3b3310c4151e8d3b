//! Marker sources: GPX waypoints and a generated demo set

use marker_cluster_lib::utils::lat_lng;
use marker_cluster_lib::{Marker, MarkerId};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// What the viewer attaches to each marker
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
}

pub type PlaceMarker = Marker<Place>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse GPX: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("File contains no waypoints")]
    NoWaypoints,
}

/// Read every waypoint of a GPX file as a marker, numbering ids from `first_id`
pub fn load_gpx_places(path: &Path, first_id: u64) -> Result<Vec<PlaceMarker>, LoadError> {
    profiling::scope!("load_gpx_places");
    let file = File::open(path)?;
    read_gpx_places(BufReader::new(file), first_id)
}

pub fn read_gpx_places<R: Read>(reader: R, first_id: u64) -> Result<Vec<PlaceMarker>, LoadError> {
    let gpx = gpx::read(reader)?;

    let places: Vec<PlaceMarker> = gpx
        .waypoints
        .iter()
        .enumerate()
        .map(|(i, waypoint)| {
            let point = waypoint.point();
            let name = waypoint
                .name
                .clone()
                .unwrap_or_else(|| format!("Waypoint {}", i + 1));
            Marker::new(
                MarkerId(first_id + i as u64),
                lat_lng(point.y(), point.x()),
                Place { name },
            )
        })
        .collect();

    if places.is_empty() {
        return Err(LoadError::NoWaypoints);
    }
    Ok(places)
}

/// Deterministic demo markers around `(lat, lng)`: a few dense hubs plus a sparse scatter,
/// so every zoom level shows both clusters and singletons.
pub fn demo_places(count: usize, lat: f64, lng: f64, first_id: u64) -> Vec<PlaceMarker> {
    const HUBS: [(f64, f64, f64); 4] = [
        (0.0, 0.0, 0.02),
        (0.08, -0.15, 0.01),
        (-0.06, 0.12, 0.03),
        (0.15, 0.2, 0.005),
    ];
    // Golden angle spreads points evenly on a disc without randomness
    const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

    (0..count)
        .map(|i| {
            let (hub_lat, hub_lng, radius) = if i % 5 == 4 {
                (0.0, 0.0, 0.3)
            } else {
                HUBS[i % HUBS.len()]
            };
            let r = radius * ((i as f64 + 0.5) / count as f64).sqrt();
            let theta = i as f64 * GOLDEN_ANGLE;

            Marker::new(
                MarkerId(first_id + i as u64),
                lat_lng(lat + hub_lat + r * theta.sin(), lng + hub_lng + r * theta.cos()),
                Place {
                    name: format!("Demo place {}", i + 1),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_cluster_lib::LeafMarker;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="marker-cluster-viewer" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="51.5007" lon="-0.1246"><name>Big Ben</name></wpt>
  <wpt lat="51.5081" lon="-0.0759"></wpt>
</gpx>"#;

    #[test]
    fn test_read_waypoints() {
        let places = read_gpx_places(GPX.as_bytes(), 100).unwrap();
        assert_eq!(places.len(), 2);

        assert_eq!(places[0].id(), MarkerId(100));
        assert_eq!(places[0].payload().name, "Big Ben");
        assert!((places[0].position().y() - 51.5007).abs() < 1e-9);
        assert!((places[0].position().x() + 0.1246).abs() < 1e-9);

        assert_eq!(places[1].id(), MarkerId(101));
        assert_eq!(places[1].payload().name, "Waypoint 2");
    }

    #[test]
    fn test_file_without_waypoints() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="marker-cluster-viewer" xmlns="http://www.topografix.com/GPX/1/1">
</gpx>"#;
        assert!(matches!(
            read_gpx_places(gpx.as_bytes(), 0),
            Err(LoadError::NoWaypoints)
        ));
    }

    #[test]
    fn test_invalid_gpx() {
        assert!(matches!(
            read_gpx_places("not xml at all".as_bytes(), 0),
            Err(LoadError::Gpx(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_gpx_places(Path::new("/definitely/not/here.gpx"), 0);
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_demo_places_are_deterministic() {
        let a = demo_places(200, 40.4, -3.7, 0);
        let b = demo_places(200, 40.4, -3.7, 0);

        assert_eq!(a.len(), 200);
        for (a, b) in a.iter().zip(&b) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.position(), b.position());
        }
        assert!(a.iter().all(|m| m.is_visible()));
        assert!(
            a.iter()
                .all(|m| (m.position().y() - 40.4).abs() < 1.0 && (m.position().x() + 3.7).abs() < 1.0)
        );
    }
}
