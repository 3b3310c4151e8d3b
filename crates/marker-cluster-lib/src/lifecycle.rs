//! Cluster marker ownership and leaf visibility

use crate::cluster::Formation;
use crate::grid::CellKey;
use crate::icons::RenderedIcon;
use crate::marker::LeafMarker;
use geo::{Coord, Point, Rect};

/// Identity of a cluster marker, unique for the lifetime of one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u64);

/// An aggregate marker placed on the map for one grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMarker {
    id: ClusterId,
    cell: CellKey,
    center: Point<f64>,
    members: Vec<usize>,
    icon: RenderedIcon,
}

impl ClusterMarker {
    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn cell(&self) -> CellKey {
        self.cell
    }

    /// Where the cluster is drawn and where a click recenters the map
    pub fn center(&self) -> Point<f64> {
        self.center
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Indices of the member markers in the engine's marker set
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn icon(&self) -> &RenderedIcon {
        &self.icon
    }

    /// Screen rectangle covered by the icon when its center projects to `screen_center`
    pub fn screen_rect(&self, screen_center: Coord<f64>) -> Rect<f64> {
        let min = Coord {
            x: screen_center.x - f64::from(self.icon.anchor[0]),
            y: screen_center.y - f64::from(self.icon.anchor[1]),
        };
        let max = Coord {
            x: min.x + f64::from(self.icon.size[0]),
            y: min.y + f64::from(self.icon.size[1]),
        };
        Rect::new(min, max)
    }

    /// Hit test a pointer position against the icon
    pub fn contains(&self, screen_center: Coord<f64>, pointer: Coord<f64>) -> bool {
        let rect = self.screen_rect(screen_center);
        (rect.min().x..=rect.max().x).contains(&pointer.x)
            && (rect.min().y..=rect.max().y).contains(&pointer.y)
    }
}

/// Owns the current cluster markers and keeps leaf visibility consistent with them
#[derive(Debug, Default)]
pub struct MarkerLifecycle {
    clusters: Vec<ClusterMarker>,
    singletons: Vec<usize>,
    next_id: u64,
}

impl MarkerLifecycle {
    pub fn clusters(&self) -> &[ClusterMarker] {
        &self.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterMarker> {
        self.clusters.iter().find(|cluster| cluster.id == id)
    }

    /// Markers left individually visible by the last applied formation
    pub fn singletons(&self) -> &[usize] {
        &self.singletons
    }

    /// Discard the previous cluster set and install `formation`.
    ///
    /// Singletons are shown and cluster members hidden; members missing from `markers` are
    /// ignored.
    pub fn apply<L: LeafMarker>(&mut self, markers: &[L], formation: Formation) {
        profiling::scope!("MarkerLifecycle::apply");

        self.clear();

        for &index in &formation.singletons {
            if let Some(marker) = markers.get(index) {
                marker.set_visible(true);
            }
        }

        self.clusters.reserve(formation.clusters.len());
        for candidate in formation.clusters {
            for &index in &candidate.members {
                if let Some(marker) = markers.get(index) {
                    marker.set_visible(false);
                }
            }

            let id = ClusterId(self.next_id);
            self.next_id += 1;
            self.clusters.push(ClusterMarker {
                id,
                cell: candidate.cell,
                center: candidate.center,
                members: candidate.members,
                icon: candidate.icon,
            });
        }

        self.singletons = formation.singletons;
    }

    /// Destroy every cluster marker and show all of `markers` individually.
    ///
    /// Returns how many cluster markers were removed.
    pub fn reset<L: LeafMarker>(&mut self, markers: &[L]) -> usize {
        let removed = self.clear();
        for marker in markers {
            marker.set_visible(true);
        }
        self.singletons = (0..markers.len()).collect();
        removed
    }

    /// Destroy every cluster marker. Leaf visibility is left as it is.
    ///
    /// Returns how many cluster markers were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.clusters.len();
        self.clusters.clear();
        self.singletons.clear();
        removed
    }
}
