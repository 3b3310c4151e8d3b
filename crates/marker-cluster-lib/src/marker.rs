//! Leaf markers supplied by the caller

use geo::Point;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A point marker the engine can cluster.
///
/// The engine only reads the position and toggles visibility. Leaf markers are created and
/// destroyed by the caller, so implementations are expected to be handles whose visibility
/// change is observed by whoever renders them.
pub trait LeafMarker {
    /// Geographic position (x = longitude, y = latitude)
    fn position(&self) -> Point<f64>;

    /// Show or hide the marker on the map
    fn set_visible(&self, visible: bool);

    /// Whether the marker is currently shown
    fn is_visible(&self) -> bool;
}

/// Caller-assigned marker identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkerId(pub u64);

/// Stock [`LeafMarker`] carrying an arbitrary payload.
///
/// Cloning is cheap and every clone shares the same visibility flag.
#[derive(Debug)]
pub struct Marker<T = ()> {
    inner: Arc<MarkerInner<T>>,
}

#[derive(Debug)]
struct MarkerInner<T> {
    id: MarkerId,
    position: Point<f64>,
    payload: T,
    visible: AtomicBool,
}

impl<T> Marker<T> {
    /// Create a visible marker
    pub fn new(id: MarkerId, position: Point<f64>, payload: T) -> Self {
        Self {
            inner: Arc::new(MarkerInner {
                id,
                position,
                payload,
                visible: AtomicBool::new(true),
            }),
        }
    }

    pub fn id(&self) -> MarkerId {
        self.inner.id
    }

    pub fn payload(&self) -> &T {
        &self.inner.payload
    }

    /// Whether two handles point at the same marker
    pub fn same_marker(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Marker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> LeafMarker for Marker<T> {
    fn position(&self) -> Point<f64> {
        self.inner.position
    }

    fn set_visible(&self, visible: bool) {
        self.inner.visible.store(visible, Ordering::Relaxed);
    }

    fn is_visible(&self) -> bool {
        self.inner.visible.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::lat_lng;

    #[test]
    fn test_new_marker_is_visible() {
        let marker = Marker::new(MarkerId(1), lat_lng(51.5, -0.12), "London");
        assert!(marker.is_visible());
        assert_eq!(marker.id(), MarkerId(1));
        assert_eq!(*marker.payload(), "London");
        assert_eq!(marker.position().y(), 51.5);
        assert_eq!(marker.position().x(), -0.12);
    }

    #[test]
    fn test_clones_share_visibility() {
        let marker = Marker::new(MarkerId(7), lat_lng(0.0, 0.0), ());
        let handle = marker.clone();

        handle.set_visible(false);
        assert!(!marker.is_visible());
        assert!(marker.same_marker(&handle));

        marker.set_visible(true);
        assert!(handle.is_visible());
    }

    #[test]
    fn test_distinct_markers_are_not_same() {
        let a = Marker::new(MarkerId(1), lat_lng(0.0, 0.0), ());
        let b = Marker::new(MarkerId(1), lat_lng(0.0, 0.0), ());
        assert!(!a.same_marker(&b));
    }
}
