//! Map host backed by the `walkers` slippy map
//!
//! walkers is immediate mode: the map memory belongs to the app and is only reachable while
//! a frame is drawn. The host therefore records the viewport seen each frame, derives settle
//! events from it, and queues zoom/center requests until the app applies them to the
//! `MapMemory` after the map widget ran.

use geo::{Coord, Point};
use marker_cluster_lib::utils::MercatorProjection;
use marker_cluster_lib::{MapHost, SettleDetector, SettleNotifier, SettleSubscription, ViewportSnapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use walkers::MapMemory;

struct HostState {
    viewport: Option<ViewportSnapshot>,
    detector: SettleDetector,
    pending_zoom: Option<f64>,
    pending_center: Option<Point<f64>>,
}

/// Cheap-to-clone handle shared between the app, the map plugin and the engine
#[derive(Clone)]
pub struct WalkersHost {
    state: Arc<Mutex<HostState>>,
    notifier: Arc<SettleNotifier>,
}

impl WalkersHost {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HostState {
                viewport: None,
                detector: SettleDetector::new(settle_delay),
                pending_zoom: None,
                pending_center: None,
            })),
            notifier: Arc::new(SettleNotifier::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the viewport drawn this frame. Returns `true` (and notifies subscribers)
    /// when the map just came to rest.
    pub fn observe(&self, snapshot: ViewportSnapshot, interacting: bool) -> bool {
        let settled = {
            let mut state = self.lock();
            state.viewport = Some(snapshot);
            state.detector.observe(snapshot, interacting, instant::Instant::now())
        };

        if settled {
            tracing::trace!(
                zoom = snapshot.zoom,
                "Viewport settled at ({:.5}, {:.5})",
                snapshot.center.y(),
                snapshot.center.x()
            );
            self.notifier.notify_settled();
        }
        settled
    }

    /// A movement was seen that has not settled yet, so the app must keep repainting
    pub fn is_settling(&self) -> bool {
        self.lock().detector.is_pending()
    }

    pub fn settle_delay(&self) -> Duration {
        self.lock().detector.settle_delay()
    }

    /// The viewport observed in the last drawn frame
    pub fn viewport(&self) -> Option<ViewportSnapshot> {
        self.lock().viewport
    }

    /// Whether a zoom or center request is waiting to be applied
    pub fn has_pending_view_change(&self) -> bool {
        let state = self.lock();
        state.pending_zoom.is_some() || state.pending_center.is_some()
    }

    /// Apply queued zoom/center requests to the map memory
    pub fn apply_pending(&self, map_memory: &mut MapMemory) {
        let (zoom, center) = {
            let mut state = self.lock();
            (state.pending_zoom.take(), state.pending_center.take())
        };

        if let Some(zoom) = zoom
            && map_memory.set_zoom(zoom).is_err()
        {
            tracing::debug!("Requested zoom {zoom:.1} is outside the map range");
        }
        if let Some(center) = center {
            map_memory.center_at(walkers::lat_lon(center.y(), center.x()));
        }
    }
}

impl MapHost for WalkersHost {
    type Projection = MercatorProjection;

    fn projection(&self) -> Option<MercatorProjection> {
        // Screen coordinates are relative to the viewport's top left corner
        self.lock().viewport.map(|viewport| {
            MercatorProjection::new(
                viewport.center,
                viewport.zoom,
                Coord {
                    x: viewport.width / 2.0,
                    y: viewport.height / 2.0,
                },
            )
        })
    }

    fn zoom(&self) -> f64 {
        let state = self.lock();
        state
            .pending_zoom
            .or(state.viewport.map(|viewport| viewport.zoom))
            .unwrap_or_default()
    }

    fn set_zoom(&self, zoom: f64) {
        self.lock().pending_zoom = Some(zoom);
    }

    fn set_center(&self, center: Point<f64>) {
        self.lock().pending_center = Some(center);
    }

    fn subscribe_settled(&self) -> SettleSubscription {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_cluster_lib::Projection;
    use marker_cluster_lib::utils::lat_lng;

    fn snapshot(zoom: f64) -> ViewportSnapshot {
        ViewportSnapshot {
            center: lat_lng(48.85, 2.35),
            zoom,
            width: 1000.0,
            height: 600.0,
        }
    }

    #[test]
    fn test_no_projection_before_first_frame() {
        let host = WalkersHost::new(Duration::ZERO);
        assert!(host.projection().is_none());
        assert_eq!(host.zoom(), 0.0);
    }

    #[test]
    fn test_projection_centers_viewport() {
        let host = WalkersHost::new(Duration::ZERO);
        host.observe(snapshot(12.0), false);

        let projection = host.projection().expect("viewport observed");
        let center = projection.to_screen(lat_lng(48.85, 2.35));
        assert!((center.x - 500.0).abs() < 1e-6);
        assert!((center.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_settle_notifies_subscribers() {
        let host = WalkersHost::new(Duration::ZERO);
        let mut subscription = host.subscribe_settled();

        assert!(!host.observe(snapshot(10.0), false));
        assert!(host.is_settling());
        assert!(host.observe(snapshot(10.0), false));
        assert!(!host.is_settling());
        assert!(subscription.take_settled());

        // Interaction holds the settle back even when nothing moved
        assert!(!host.observe(snapshot(11.0), false));
        assert!(!host.observe(snapshot(11.0), true));
        assert!(!subscription.take_settled());
    }

    #[test]
    fn test_zoom_requests_are_queued() {
        let host = WalkersHost::new(Duration::ZERO);
        host.observe(snapshot(10.0), false);
        assert!(!host.has_pending_view_change());

        host.set_zoom(11.0);
        host.set_center(lat_lng(48.86, 2.36));
        assert!(host.has_pending_view_change());
        assert_eq!(host.zoom(), 11.0);

        let mut memory = MapMemory::default();
        host.apply_pending(&mut memory);
        assert!(!host.has_pending_view_change());
        assert_eq!(memory.zoom(), 11.0);
    }

    #[test]
    fn test_clones_share_state() {
        let host = WalkersHost::new(Duration::from_millis(250));
        let clone = host.clone();
        clone.observe(snapshot(9.0), false);

        assert_eq!(host.viewport(), Some(snapshot(9.0)));
        assert_eq!(host.settle_delay(), Duration::from_millis(250));
    }
}
