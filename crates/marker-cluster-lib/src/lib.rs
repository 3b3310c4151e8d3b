//! Marker Cluster Library - Viewport-driven clustering of map markers
//!
//! This library groups geographic point markers into count-labelled clusters so that large
//! marker sets stay readable on an interactive map. The partition is recomputed from scratch
//! every time the host map's viewport settles: markers are projected to screen space, bucketed
//! into a fixed pixel grid, and every sufficiently populated cell becomes one cluster.
//!
//! # Architecture
//!
//! - **[`grid`]**: screen-space grid bucketing of projected markers
//! - **[`cluster`]**: per-cell cluster formation (threshold, center, tier, icon)
//! - **[`MarkerLifecycle`]**: owns cluster markers and toggles leaf visibility
//! - **[`ViewportEventBridge`]**: listens for "viewport settled" notifications
//! - **[`ClusterEngine`]**: attach/detach state machine and public marker-set API
//!
//! # Performance Characteristics
//!
//! - **Pass Time**: O(N) per viewport settle, N = number of markers
//! - **Memory**: O(N) per pass, nothing is retained between passes except the cluster set
//!
//! # Example
//!
//! ```rust
//! use marker_cluster_lib::{ClusterConfig, ClusterEngine, LinearProjection, Marker, MarkerId, StaticMap};
//! use marker_cluster_lib::utils::lat_lng;
//!
//! let markers: Vec<Marker> = (0..5)
//!     .map(|i| Marker::new(MarkerId(i), lat_lng(10.0, 10.0 + i as f64), ()))
//!     .collect();
//!
//! let map = StaticMap::new(Some(LinearProjection::default()), 10.0);
//! let mut engine = ClusterEngine::new(markers, ClusterConfig::default());
//! engine.set_map(Some(map));
//!
//! assert_eq!(engine.clusters().len(), 1);
//! assert_eq!(engine.clusters()[0].count(), 5);
//! ```

mod bridge;
pub mod cluster;
mod config;
mod engine;
pub mod grid;
mod host;
mod icons;
mod lifecycle;
mod marker;
pub mod utils;

// Public API exports
pub use bridge::{SettleDetector, SettleNotifier, SettleSubscription, ViewportEventBridge, ViewportSnapshot};
pub use cluster::{ClusterCandidate, Formation};
pub use config::ClusterConfig;
pub use engine::{ClusterEngine, EngineState, PassOutcome, PassSummary};
pub use grid::{CellKey, GridBuckets, GridCell};
pub use host::{LinearProjection, MapHost, Projection, StaticMap};
pub use icons::{CountLabel, DefaultTiers, IconRenderer, IconTier, RenderedIcon, TierPolicy, default_icon_tiers};
pub use lifecycle::{ClusterId, ClusterMarker, MarkerLifecycle};
pub use marker::{LeafMarker, Marker, MarkerId};

/// Diagnostics raised while clustering.
///
/// None of these is ever surfaced to the caller as a failure: a pass either completes or is
/// skipped, and the non-fatal kinds are logged and degraded around.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusterError {
    #[error("Map projection is not available yet")]
    ProjectionUnavailable,

    #[error("Engine is not attached to a map")]
    NotAttached,

    #[error("Tier index {index} exceeds the icon table, clamped to {clamped}")]
    TierOverflow { index: usize, clamped: usize },

    #[error("Icon table is empty, cluster of {count} markers in cell {cell} not rendered")]
    MissingIconTable { cell: CellKey, count: usize },
}

pub type Result<T> = std::result::Result<T, ClusterError>;
