//! Host map abstraction consumed by the engine

use crate::bridge::{SettleNotifier, SettleSubscription};
use geo::{Coord, Point};
use std::sync::{Arc, Mutex, PoisonError};

/// Geographic → screen offset conversion for the current viewport
pub trait Projection {
    /// Project a position (x = longitude, y = latitude) to screen pixels
    fn to_screen(&self, position: Point<f64>) -> Coord<f64>;
}

/// The interactive map a [`ClusterEngine`](crate::ClusterEngine) attaches to.
///
/// Hosts are handles: the engine keeps one for as long as it is attached and drives pan/zoom
/// through `&self`, so implementations use interior mutability.
pub trait MapHost {
    type Projection: Projection;

    /// Projection of the current viewport, `None` while the map is still initializing
    fn projection(&self) -> Option<Self::Projection>;

    fn zoom(&self) -> f64;

    fn set_zoom(&self, zoom: f64);

    fn set_center(&self, center: Point<f64>);

    /// Subscribe to "viewport settled" notifications; dropping the subscription unsubscribes
    fn subscribe_settled(&self) -> SettleSubscription;
}

/// Flat projection: `x = origin.x + lng * scale`, `y = origin.y - lat * scale`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearProjection {
    pub scale: f64,
    pub origin: Coord<f64>,
}

impl Default for LinearProjection {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin: Coord { x: 0.0, y: 0.0 },
        }
    }
}

impl Projection for LinearProjection {
    fn to_screen(&self, position: Point<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + position.x() * self.scale,
            y: self.origin.y - position.y() * self.scale,
        }
    }
}

/// Headless [`MapHost`] with a caller-controlled viewport.
///
/// Useful for tests, benchmarks and batch rendering where no interactive map exists.
/// Settles are only ever signalled through [`StaticMap::settle`].
#[derive(Debug)]
pub struct StaticMap<P = LinearProjection> {
    state: Arc<Mutex<StaticMapState<P>>>,
    notifier: Arc<SettleNotifier>,
}

#[derive(Debug)]
struct StaticMapState<P> {
    projection: Option<P>,
    zoom: f64,
    center: Option<Point<f64>>,
}

impl<P> Clone for StaticMap<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<P: Projection + Clone> StaticMap<P> {
    pub fn new(projection: Option<P>, zoom: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(StaticMapState {
                projection,
                zoom,
                center: None,
            })),
            notifier: Arc::new(SettleNotifier::new()),
        }
    }

    /// Replace the viewport projection without notifying listeners
    pub fn set_projection(&self, projection: Option<P>) {
        self.lock().projection = projection;
    }

    /// Last center requested through [`MapHost::set_center`]
    pub fn center(&self) -> Option<Point<f64>> {
        self.lock().center
    }

    /// Signal that the viewport came to rest
    pub fn settle(&self) {
        self.notifier.notify_settled();
    }

    /// Number of live settle subscriptions
    pub fn listener_count(&self) -> usize {
        self.notifier.listener_count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StaticMapState<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: Projection + Clone> MapHost for StaticMap<P> {
    type Projection = P;

    fn projection(&self) -> Option<P> {
        self.lock().projection.clone()
    }

    fn zoom(&self) -> f64 {
        self.lock().zoom
    }

    fn set_zoom(&self, zoom: f64) {
        self.lock().zoom = zoom;
    }

    fn set_center(&self, center: Point<f64>) {
        self.lock().center = Some(center);
    }

    fn subscribe_settled(&self) -> SettleSubscription {
        self.notifier.subscribe()
    }
}
