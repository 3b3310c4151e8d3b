//! Viewport "settled" notifications
//!
//! Hosts own a [`SettleNotifier`] and fire it once a pan/zoom gesture comes to rest. The engine
//! holds a [`SettleSubscription`] through its [`ViewportEventBridge`] while attached. The
//! channel only carries a generation counter, so any number of settles between two polls
//! collapses into a single recluster pass on the newest viewport.
//!
//! Immediate-mode hosts that only know the viewport of the current frame can derive settles
//! with a [`SettleDetector`].

use crate::host::MapHost;
use geo::Point;
use instant::Instant;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// Host-side sender of settle notifications
#[derive(Debug)]
pub struct SettleNotifier {
    sender: watch::Sender<u64>,
}

impl SettleNotifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    /// Notify every subscriber that the viewport settled
    pub fn notify_settled(&self) {
        self.sender.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub fn subscribe(&self) -> SettleSubscription {
        SettleSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of settles signalled so far
    pub fn generation(&self) -> u64 {
        *self.sender.borrow()
    }
}

impl Default for SettleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener end of a [`SettleNotifier`]; dropping it unsubscribes
#[derive(Debug)]
pub struct SettleSubscription {
    receiver: watch::Receiver<u64>,
}

impl SettleSubscription {
    /// Whether at least one settle happened since the previous call.
    ///
    /// A closed notifier reads as "no settle".
    pub fn take_settled(&mut self) -> bool {
        match self.receiver.has_changed() {
            Ok(true) => {
                self.receiver.borrow_and_update();
                true
            }
            Ok(false) | Err(_) => false,
        }
    }
}

/// Binds the engine to a host's settle notifications while attached
#[derive(Debug, Default)]
pub struct ViewportEventBridge {
    subscription: Option<SettleSubscription>,
}

impl ViewportEventBridge {
    /// Subscribe to `map`, replacing any previous subscription
    pub fn bind<M: MapHost>(&mut self, map: &M) {
        self.subscription = Some(map.subscribe_settled());
    }

    pub fn unbind(&mut self) {
        self.subscription = None;
    }

    pub fn is_bound(&self) -> bool {
        self.subscription.is_some()
    }

    /// Consume pending settles, `true` if a recluster is due
    pub fn take_settled(&mut self) -> bool {
        self.subscription
            .as_mut()
            .is_some_and(SettleSubscription::take_settled)
    }
}

/// The part of a viewport that decides whether it moved
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewportSnapshot {
    /// Geographic center (x = longitude, y = latitude)
    pub center: Point<f64>,
    pub zoom: f64,
    /// Viewport size in pixels
    pub width: f64,
    pub height: f64,
}

/// Derives settle events from per-frame viewport observations.
///
/// A settle fires once the viewport has stayed identical for `settle_delay` with no
/// interaction in progress, and then not again until the viewport changes.
#[derive(Debug, Clone)]
pub struct SettleDetector {
    settle_delay: Duration,
    last: Option<ViewportSnapshot>,
    last_change: Option<Instant>,
    pending: bool,
}

impl SettleDetector {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            last: None,
            last_change: None,
            pending: false,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Whether a movement was seen that has not settled yet
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Feed the viewport of the current frame; returns `true` when it just settled
    pub fn observe(&mut self, snapshot: ViewportSnapshot, interacting: bool, now: Instant) -> bool {
        if interacting || self.last != Some(snapshot) {
            self.last = Some(snapshot);
            self.last_change = Some(now);
            self.pending = true;
            return false;
        }

        let quiet_for = self
            .last_change
            .map_or(Duration::ZERO, |changed| now.duration_since(changed));

        if self.pending && quiet_for >= self.settle_delay {
            self.pending = false;
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{LinearProjection, StaticMap};
    use crate::utils::lat_lng;

    fn snapshot(zoom: f64) -> ViewportSnapshot {
        ViewportSnapshot {
            center: lat_lng(51.5, -0.1),
            zoom,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn test_subscription_sees_each_batch_once() {
        let notifier = SettleNotifier::new();
        let mut subscription = notifier.subscribe();
        assert!(!subscription.take_settled());

        notifier.notify_settled();
        notifier.notify_settled();
        notifier.notify_settled();

        assert!(subscription.take_settled());
        assert!(!subscription.take_settled());
        assert_eq!(notifier.generation(), 3);
    }

    #[test]
    fn test_subscription_ignores_settles_before_subscribing() {
        let notifier = SettleNotifier::new();
        notifier.notify_settled();

        let mut subscription = notifier.subscribe();
        assert!(!subscription.take_settled());
    }

    #[test]
    fn test_closed_notifier_reads_as_no_settle() {
        let notifier = SettleNotifier::new();
        let mut subscription = notifier.subscribe();
        notifier.notify_settled();
        drop(notifier);

        assert!(!subscription.take_settled());
    }

    #[test]
    fn test_bridge_bind_unbind() {
        let map = StaticMap::new(Some(LinearProjection::default()), 1.0);
        let mut bridge = ViewportEventBridge::default();
        assert!(!bridge.is_bound());

        map.settle();
        assert!(!bridge.take_settled());

        bridge.bind(&map);
        assert_eq!(map.listener_count(), 1);
        map.settle();
        assert!(bridge.take_settled());

        bridge.bind(&map);
        assert_eq!(map.listener_count(), 1, "rebinding must not leak listeners");

        bridge.unbind();
        assert_eq!(map.listener_count(), 0);
        map.settle();
        assert!(!bridge.take_settled());
    }

    #[test]
    fn test_detector_fires_once_after_delay() {
        let start = Instant::now();
        let mut detector = SettleDetector::new(Duration::from_millis(100));

        assert!(!detector.observe(snapshot(10.0), false, start));
        assert!(detector.is_pending());
        assert!(!detector.observe(snapshot(10.0), false, start + Duration::from_millis(50)));
        assert!(detector.observe(snapshot(10.0), false, start + Duration::from_millis(100)));
        assert!(!detector.is_pending());
        assert!(!detector.observe(snapshot(10.0), false, start + Duration::from_millis(500)));
    }

    #[test]
    fn test_detector_restarts_on_movement() {
        let start = Instant::now();
        let mut detector = SettleDetector::new(Duration::from_millis(100));

        detector.observe(snapshot(10.0), false, start);
        assert!(!detector.observe(snapshot(10.5), false, start + Duration::from_millis(90)));
        assert!(!detector.observe(snapshot(10.5), false, start + Duration::from_millis(150)));
        assert!(detector.observe(snapshot(10.5), false, start + Duration::from_millis(190)));
    }

    #[test]
    fn test_detector_waits_for_interaction_to_end() {
        let start = Instant::now();
        let mut detector = SettleDetector::new(Duration::from_millis(100));

        detector.observe(snapshot(10.0), false, start);
        // Pointer held down without moving
        assert!(!detector.observe(snapshot(10.0), true, start + Duration::from_millis(200)));
        assert!(!detector.observe(snapshot(10.0), false, start + Duration::from_millis(250)));
        assert!(detector.observe(snapshot(10.0), false, start + Duration::from_millis(300)));
    }
}
