//! Cluster formation: turns grid cells into clusters and singletons

use crate::config::ClusterConfig;
use crate::grid::{CellKey, GridBuckets, GridCell};
use crate::icons::{RenderedIcon, clamp_tier};
use crate::marker::LeafMarker;
use crate::ClusterError;
use geo::{Centroid, MultiPoint, Point};

/// A cell that became a cluster, with its center and icon resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCandidate {
    pub cell: CellKey,
    pub center: Point<f64>,
    /// Indices into the marker slice
    pub members: Vec<usize>,
    pub icon: RenderedIcon,
}

/// Outcome of cluster formation for one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formation {
    pub clusters: Vec<ClusterCandidate>,
    /// Markers that stay individually visible
    pub singletons: Vec<usize>,
    /// Non-fatal problems met while forming clusters
    pub diagnostics: Vec<ClusterError>,
}

/// Decide, cell by cell, which markers are clustered and which stay on their own.
///
/// A cell becomes a cluster iff it holds at least `min_cluster_size` markers. With an empty
/// icon table no cluster can be drawn, so such cells keep their members visible instead.
pub fn form_clusters<L: LeafMarker>(
    buckets: &GridBuckets,
    markers: &[L],
    config: &ClusterConfig,
) -> Formation {
    profiling::scope!("cluster::form_clusters");

    let min_cluster_size = config.effective_min_cluster_size();
    let mut formation = Formation {
        singletons: buckets.unplaced().to_vec(),
        ..Formation::default()
    };

    for cell in buckets.cells() {
        if cell.len() < min_cluster_size {
            formation.singletons.extend_from_slice(cell.members());
            continue;
        }

        let count = cell.len();
        let requested = config.tier_policy.tier_for(count);
        let Some((tier_index, overflow)) = clamp_tier(requested, config.icons.len()) else {
            formation.diagnostics.push(ClusterError::MissingIconTable {
                cell: cell.key(),
                count,
            });
            formation.singletons.extend_from_slice(cell.members());
            continue;
        };
        formation.diagnostics.extend(overflow);

        let icon = config
            .renderer
            .render(count, tier_index, &config.icons[tier_index]);

        formation.clusters.push(ClusterCandidate {
            cell: cell.key(),
            center: cluster_center(cell, markers, config.average_center),
            members: cell.members().to_vec(),
            icon,
        });
    }

    formation
}

/// Mean member position, or the first member's position when not averaging.
///
/// The first member follows marker order, so an unstable input order can move the center
/// between passes.
fn cluster_center<L: LeafMarker>(cell: &GridCell, markers: &[L], average: bool) -> Point<f64> {
    let first = markers[cell.members()[0]].position();
    if !average {
        return first;
    }

    let points: MultiPoint<f64> = cell
        .members()
        .iter()
        .map(|&index| markers[index].position())
        .collect();
    points.centroid().unwrap_or(first)
}
