//! ClusterEngine - attach/detach state machine and recluster orchestration
//!
//! The engine ties the pieces together: while attached to a [`MapHost`] it listens for
//! viewport settles and, on each one, runs grid bucketing, cluster formation and the marker
//! lifecycle update as one synchronous pass. Every pass recomputes the partition from the
//! latest marker set and viewport, so passes are idempotent and the newest one always wins.

use crate::bridge::ViewportEventBridge;
use crate::cluster::form_clusters;
use crate::config::ClusterConfig;
use crate::grid::bucket_markers;
use crate::host::MapHost;
use crate::lifecycle::{ClusterId, ClusterMarker, MarkerLifecycle};
use crate::marker::LeafMarker;
use crate::{ClusterError, Result};

/// Whether the engine is bound to a map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No map, no listener, no clusters
    Detached,
    /// Map bound, listener active, clusters reflect the latest markers and viewport
    Attached,
}

/// Statistics of a completed recluster pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Number of occupied grid cells
    pub cells: usize,
    pub clusters: usize,
    /// Markers hidden inside clusters
    pub clustered_markers: usize,
    /// Markers left individually visible
    pub singletons: usize,
    /// Clusters that could not be rendered (empty icon table)
    pub skipped_clusters: usize,
}

/// Result of a recluster attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Completed(PassSummary),
    /// Nothing was changed; the next settle retries
    Skipped(ClusterError),
}

impl PassOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The pass summary, or why the pass was skipped
    pub fn into_result(self) -> Result<PassSummary> {
        match self {
            Self::Completed(summary) => Ok(summary),
            Self::Skipped(reason) => Err(reason),
        }
    }
}

/// Viewport-driven marker clusterer bound to at most one map
pub struct ClusterEngine<M, L> {
    map: Option<M>,
    markers: Vec<L>,
    config: ClusterConfig,
    bridge: ViewportEventBridge,
    lifecycle: MarkerLifecycle,
    last_summary: Option<PassSummary>,
}

impl<M, L> ClusterEngine<M, L>
where
    M: MapHost,
    L: LeafMarker,
{
    /// Create a detached engine
    pub fn new(markers: Vec<L>, config: ClusterConfig) -> Self {
        Self {
            map: None,
            markers,
            config,
            bridge: ViewportEventBridge::default(),
            lifecycle: MarkerLifecycle::default(),
            last_summary: None,
        }
    }

    /// Attach to `map` (listen for settles and recluster now) or detach with `None`.
    ///
    /// Detaching destroys every cluster marker but does not show the hidden leaf markers
    /// again; callers re-attaching must not assume any particular leaf visibility.
    pub fn set_map(&mut self, map: Option<M>) {
        match map {
            Some(map) => {
                self.bridge.bind(&map);
                self.map = Some(map);
                tracing::debug!("Cluster engine attached to map");
                self.recluster_inputs_changed();
            }
            None => {
                self.bridge.unbind();
                self.map = None;
                let removed = self.lifecycle.clear();
                self.last_summary = None;
                tracing::debug!(removed, "Cluster engine detached, cluster markers removed");
            }
        }
    }

    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub fn state(&self) -> EngineState {
        if self.map.is_some() {
            EngineState::Attached
        } else {
            EngineState::Detached
        }
    }

    /// Replace the whole marker set, reclustering immediately when attached.
    ///
    /// Duplicate entries are kept and clustered as provided.
    pub fn set_markers(&mut self, markers: Vec<L>) {
        self.markers = markers;
        if self.map.is_some() {
            self.recluster_inputs_changed();
        }
    }

    pub fn markers(&self) -> &[L] {
        &self.markers
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Replace the configuration, reclustering immediately when attached
    pub fn set_config(&mut self, config: ClusterConfig) {
        self.config = config;
        if self.map.is_some() {
            self.recluster();
        }
    }

    /// Current cluster markers
    pub fn clusters(&self) -> &[ClusterMarker] {
        self.lifecycle.clusters()
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterMarker> {
        self.lifecycle.cluster(id)
    }

    /// Member markers of a cluster
    pub fn cluster_members(&self, id: ClusterId) -> impl Iterator<Item = &L> {
        self.cluster(id)
            .map(ClusterMarker::members)
            .unwrap_or_default()
            .iter()
            .filter_map(move |&index| self.markers.get(index))
    }

    /// Markers left individually visible by the last completed pass
    pub fn visible_singletons(&self) -> impl Iterator<Item = &L> {
        self.lifecycle
            .singletons()
            .iter()
            .filter_map(move |&index| self.markers.get(index))
    }

    /// Statistics of the last completed pass while attached
    pub fn last_summary(&self) -> Option<PassSummary> {
        self.last_summary
    }

    /// Run a pass if the map reported a settled viewport since the last poll.
    ///
    /// Several settles between two polls result in a single pass.
    pub fn poll_viewport(&mut self) -> Option<PassOutcome> {
        if self.bridge.take_settled() {
            Some(self.recluster())
        } else {
            None
        }
    }

    /// Recompute the full partition against the current viewport.
    ///
    /// Without a map or a projection the pass is skipped and no state changes.
    pub fn recluster(&mut self) -> PassOutcome {
        profiling::scope!("ClusterEngine::recluster");

        let Some(map) = &self.map else {
            return PassOutcome::Skipped(ClusterError::NotAttached);
        };

        let Some(projection) = map.projection() else {
            tracing::debug!(
                "Skipping recluster pass: {}",
                ClusterError::ProjectionUnavailable
            );
            return PassOutcome::Skipped(ClusterError::ProjectionUnavailable);
        };

        if self.markers.is_empty() {
            tracing::trace!("Empty marker set, clearing clusters");
        }

        let buckets = bucket_markers(&self.markers, &projection, self.config.effective_grid_size());
        let formation = form_clusters(&buckets, &self.markers, &self.config);

        let mut skipped_clusters = 0;
        for diagnostic in &formation.diagnostics {
            match diagnostic {
                ClusterError::MissingIconTable { .. } => {
                    skipped_clusters += 1;
                    tracing::warn!("{diagnostic}");
                }
                other => tracing::trace!("{other}"),
            }
        }

        let summary = PassSummary {
            cells: buckets.cells().len(),
            clusters: formation.clusters.len(),
            clustered_markers: formation.clusters.iter().map(|c| c.members.len()).sum(),
            singletons: formation.singletons.len(),
            skipped_clusters,
        };

        self.lifecycle.apply(&self.markers, formation);
        self.last_summary = Some(summary);

        tracing::debug!(
            markers = self.markers.len(),
            cells = summary.cells,
            clusters = summary.clusters,
            singletons = summary.singletons,
            "Recluster pass complete"
        );

        PassOutcome::Completed(summary)
    }

    /// Recluster after the marker set or the map changed.
    ///
    /// Clusters of the previous pass index into the old inputs, so a skipped pass cannot
    /// keep them: every marker is shown on its own until the next pass completes.
    fn recluster_inputs_changed(&mut self) -> PassOutcome {
        let outcome = self.recluster();
        if !outcome.is_completed() {
            let removed = self.lifecycle.reset(&self.markers);
            self.last_summary = None;
            tracing::debug!(removed, "Pass skipped after input change, stale clusters removed");
        }
        outcome
    }

    /// Zoom the map in to the next integer level and recenter it on a cluster.
    ///
    /// A fractional zoom steps to the next whole level (8.3 becomes 9).
    ///
    /// Returns `false` if the cluster no longer exists or the engine is detached.
    pub fn zoom_to_cluster(&self, id: ClusterId) -> bool {
        let (Some(map), Some(cluster)) = (&self.map, self.cluster(id)) else {
            return false;
        };

        map.set_zoom((map.zoom() + 1.0).floor());
        map.set_center(cluster.center());
        tracing::debug!(
            count = cluster.count(),
            "Zooming into cluster at ({:.5}, {:.5})",
            cluster.center().y(),
            cluster.center().x()
        );
        true
    }
}
