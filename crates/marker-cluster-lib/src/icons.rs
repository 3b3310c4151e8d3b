//! Cluster icon tiers and rendering

use crate::ClusterError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Structured description of one icon tier
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IconTier {
    /// Icon size in pixels (width, height)
    pub size: [f32; 2],
    /// Pixel inside the icon that sits on the cluster center
    pub anchor: [f32; 2],
    /// Fill color as RGBA
    pub color: [u8; 4],
}

impl IconTier {
    /// Round icon of the given diameter anchored at its middle
    pub fn circle(diameter: f32, color: [u8; 4]) -> Self {
        Self {
            size: [diameter, diameter],
            anchor: [diameter / 2.0, diameter / 2.0],
            color,
        }
    }
}

/// The classic five marker-cluster tiers, blue through purple
pub fn default_icon_tiers() -> Vec<IconTier> {
    vec![
        IconTier::circle(53.0, [0, 140, 255, 200]),
        IconTier::circle(56.0, [255, 191, 0, 200]),
        IconTier::circle(66.0, [255, 64, 64, 200]),
        IconTier::circle(78.0, [255, 64, 192, 200]),
        IconTier::circle(90.0, [160, 64, 255, 200]),
    ]
}

/// Maps a cluster's member count to an index into the icon table
pub trait TierPolicy: Send + Sync {
    fn tier_for(&self, count: usize) -> usize;
}

impl<F> TierPolicy for F
where
    F: Fn(usize) -> usize + Send + Sync,
{
    fn tier_for(&self, count: usize) -> usize {
        self(count)
    }
}

/// Tier 0 below 10, 1 below 100, 2 below 500, 3 below 1000, 4 otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTiers;

impl DefaultTiers {
    const THRESHOLDS: [usize; 4] = [10, 100, 500, 1000];
}

impl TierPolicy for DefaultTiers {
    fn tier_for(&self, count: usize) -> usize {
        Self::THRESHOLDS
            .iter()
            .take_while(|&&threshold| count >= threshold)
            .count()
    }
}

/// A cluster icon ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedIcon {
    pub tier: usize,
    pub label: String,
    pub size: [f32; 2],
    pub anchor: [f32; 2],
    pub color: [u8; 4],
}

/// Produces the concrete icon for a cluster of `count` markers
pub trait IconRenderer: Send + Sync {
    fn render(&self, count: usize, tier_index: usize, tier: &IconTier) -> RenderedIcon;
}

/// Default renderer: the tier's look, labelled with the literal member count
#[derive(Debug, Clone, Copy, Default)]
pub struct CountLabel;

impl IconRenderer for CountLabel {
    fn render(&self, count: usize, tier_index: usize, tier: &IconTier) -> RenderedIcon {
        RenderedIcon {
            tier: tier_index,
            label: count.to_string(),
            size: tier.size,
            anchor: tier.anchor,
            color: tier.color,
        }
    }
}

/// Clamp a policy's tier index into a table of `table_len` icons.
///
/// Returns the usable index plus the overflow diagnostic when clamping happened, or `None`
/// when the table is empty.
pub(crate) fn clamp_tier(index: usize, table_len: usize) -> Option<(usize, Option<ClusterError>)> {
    let last = table_len.checked_sub(1)?;
    if index > last {
        Some((
            last,
            Some(ClusterError::TierOverflow {
                index,
                clamped: last,
            }),
        ))
    } else {
        Some((index, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tier_boundaries() {
        let tiers = DefaultTiers;
        assert_eq!(tiers.tier_for(0), 0);
        assert_eq!(tiers.tier_for(2), 0);
        assert_eq!(tiers.tier_for(9), 0);
        assert_eq!(tiers.tier_for(10), 1);
        assert_eq!(tiers.tier_for(12), 1);
        assert_eq!(tiers.tier_for(99), 1);
        assert_eq!(tiers.tier_for(100), 2);
        assert_eq!(tiers.tier_for(499), 2);
        assert_eq!(tiers.tier_for(500), 3);
        assert_eq!(tiers.tier_for(999), 3);
        assert_eq!(tiers.tier_for(1000), 4);
        assert_eq!(tiers.tier_for(1_000_000), 4);
    }

    #[test]
    fn test_default_tiers_are_monotonic() {
        let tiers = DefaultTiers;
        let mut previous = 0;
        for count in 0..2_000 {
            let tier = tiers.tier_for(count);
            assert!(tier >= previous, "tier dropped at count {count}");
            previous = tier;
        }
    }

    #[test]
    fn test_closure_policy() {
        let policy = |count: usize| count / 3;
        assert_eq!(policy.tier_for(7), 2);
    }

    #[test]
    fn test_clamp_tier() {
        assert_eq!(clamp_tier(2, 5), Some((2, None)));
        assert_eq!(
            clamp_tier(9, 5),
            Some((
                4,
                Some(ClusterError::TierOverflow {
                    index: 9,
                    clamped: 4
                })
            ))
        );
        assert_eq!(clamp_tier(0, 0), None);
    }

    #[test]
    fn test_count_label_uses_literal_count() {
        let tier = IconTier::circle(40.0, [1, 2, 3, 4]);
        let icon = CountLabel.render(1234, 4, &tier);
        assert_eq!(icon.label, "1234");
        assert_eq!(icon.tier, 4);
        assert_eq!(icon.size, [40.0, 40.0]);
        assert_eq!(icon.anchor, [20.0, 20.0]);
        assert_eq!(icon.color, [1, 2, 3, 4]);
    }

    #[test]
    fn test_default_table_has_five_growing_tiers() {
        let table = default_icon_tiers();
        assert_eq!(table.len(), 5);
        assert!(table.windows(2).all(|pair| pair[0].size[0] < pair[1].size[0]));
    }
}
