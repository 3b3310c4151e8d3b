//! Clustering configuration

use crate::icons::{CountLabel, DefaultTiers, IconRenderer, IconTier, TierPolicy, default_icon_tiers};
use std::fmt;
use std::sync::Arc;

/// Configuration for a [`ClusterEngine`](crate::ClusterEngine)
#[derive(Clone)]
pub struct ClusterConfig {
    /// Edge length of a grid cell in screen pixels (default 60)
    pub grid_size: f64,
    /// Minimum number of markers in a cell for it to become a cluster (default 2)
    pub min_cluster_size: usize,
    /// Center clusters on the mean member position instead of the first member (default false)
    pub average_center: bool,
    /// Icon tiers, indexed by `tier_policy`
    pub icons: Vec<IconTier>,
    /// Member count → tier index
    pub tier_policy: Arc<dyn TierPolicy>,
    /// Builds the concrete icon of each cluster
    pub renderer: Arc<dyn IconRenderer>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            grid_size: 60.0,
            min_cluster_size: 2,
            average_center: false,
            icons: default_icon_tiers(),
            tier_policy: Arc::new(DefaultTiers),
            renderer: Arc::new(CountLabel),
        }
    }
}

impl ClusterConfig {
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    pub fn with_average_center(mut self, average_center: bool) -> Self {
        self.average_center = average_center;
        self
    }

    pub fn with_icons(mut self, icons: Vec<IconTier>) -> Self {
        self.icons = icons;
        self
    }

    pub fn with_tier_policy(mut self, policy: impl TierPolicy + 'static) -> Self {
        self.tier_policy = Arc::new(policy);
        self
    }

    pub fn with_renderer(mut self, renderer: impl IconRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Grid size actually used by a pass: at least one pixel, NaN falls back to one
    pub fn effective_grid_size(&self) -> f64 {
        self.grid_size.max(1.0)
    }

    /// Cluster threshold actually used by a pass: a cluster needs at least one member
    pub fn effective_min_cluster_size(&self) -> usize {
        self.min_cluster_size.max(1)
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("grid_size", &self.grid_size)
            .field("min_cluster_size", &self.min_cluster_size)
            .field("average_center", &self.average_center)
            .field("icons", &self.icons)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.grid_size, 60.0);
        assert_eq!(config.min_cluster_size, 2);
        assert!(!config.average_center);
        assert_eq!(config.icons.len(), 5);
        assert_eq!(config.tier_policy.tier_for(12), 1);
    }

    #[test]
    fn test_builders() {
        let config = ClusterConfig::default()
            .with_grid_size(80.0)
            .with_min_cluster_size(3)
            .with_average_center(true)
            .with_icons(Vec::new())
            .with_tier_policy(|_count: usize| 7);

        assert_eq!(config.grid_size, 80.0);
        assert_eq!(config.min_cluster_size, 3);
        assert!(config.average_center);
        assert!(config.icons.is_empty());
        assert_eq!(config.tier_policy.tier_for(1), 7);
    }

    #[test]
    fn test_effective_values_are_sane() {
        let config = ClusterConfig::default()
            .with_grid_size(f64::NAN)
            .with_min_cluster_size(0);
        assert_eq!(config.effective_grid_size(), 1.0);
        assert_eq!(config.effective_min_cluster_size(), 1);

        let config = ClusterConfig::default().with_grid_size(0.25);
        assert_eq!(config.effective_grid_size(), 1.0);
    }

    #[test]
    fn test_debug_output() {
        let debug = format!("{:?}", ClusterConfig::default());
        assert!(debug.contains("grid_size: 60.0"));
        assert!(debug.contains(".."));
    }
}
