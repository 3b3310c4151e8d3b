//! Utility functions for coordinate conversions and screen projection

use crate::host::Projection;
use geo::{Coord, Point};

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Edge length of a slippy-map tile in pixels; the world is one tile wide at zoom 0
pub const TILE_SIZE: f64 = 256.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Build a position from latitude and longitude in degrees
#[inline(always)]
pub fn lat_lng(lat: f64, lng: f64) -> Point<f64> {
    Point::new(lng, lat)
}

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the Web Mercator range.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Width of the whole world in pixels at the given (possibly fractional) zoom
#[inline(always)]
pub fn world_size_pixels(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Convert WGS84 to world pixel coordinates (origin top-left, y growing southwards)
pub fn wgs84_to_world_pixels(lat: f64, lon: f64, zoom: f64) -> Coord<f64> {
    let mercator = wgs84_to_mercator(lat, lon);
    let pixels_per_meter = world_size_pixels(zoom) / EARTH_SIZE_METERS;
    Coord {
        x: (mercator.x() - EARTH_MERCATOR_MIN) * pixels_per_meter,
        y: (EARTH_MERCATOR_MAX - mercator.y()) * pixels_per_meter,
    }
}

/// Web Mercator projection of a viewport onto the screen.
///
/// `center` lands on `screen_center`; everything else is offset in world pixels at `zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    zoom: f64,
    center_world: Coord<f64>,
    screen_center: Coord<f64>,
}

impl MercatorProjection {
    pub fn new(center: Point<f64>, zoom: f64, screen_center: Coord<f64>) -> Self {
        Self {
            zoom,
            center_world: wgs84_to_world_pixels(center.y(), center.x(), zoom),
            screen_center,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

impl Projection for MercatorProjection {
    fn to_screen(&self, position: Point<f64>) -> Coord<f64> {
        let world = wgs84_to_world_pixels(position.y(), position.x(), self.zoom);
        Coord {
            x: world.x - self.center_world.x + self.screen_center.x,
            y: world.y - self.center_world.y + self.screen_center.y,
        }
    }
}
