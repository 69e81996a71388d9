//! Spherical Mercator projection onto the unit square.
//!
//! Longitude maps linearly onto `x`, latitude onto `y` with `y = 0` at the
//! northern edge of the Web Mercator world.

use geo::Point;
use std::f64::consts::PI;

/// Project a longitude onto `x` in `[0, 1]`.
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project a latitude onto `y`, clamped into `[0, 1]`.
pub fn lat_y(lat: f64) -> f64 {
    let lat = lat.clamp(-90.0, 90.0);
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Inverse of [`lng_x`].
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Inverse of [`lat_y`] for `y` in the open interval `(0, 1)`.
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Project a geographic point (`x` = longitude, `y` = latitude).
pub fn project(point: Point<f64>) -> [f64; 2] {
    [lng_x(point.x()), lat_y(point.y())]
}

/// Convert projected coordinates back to a geographic point.
pub fn unproject(x: f64, y: f64) -> Point<f64> {
    Point::new(x_lng(x), y_lat(y))
}
