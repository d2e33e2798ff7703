//! Geometry utilities
//!
//! Great-circle distance and bearing normalization used by the culling
//! stages, plus the [`LatLng`] and [`Bounds`] types shared by the whole crate.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees clockwise from true north, normalized to [0, 360)
//! - Distance: meters on a sphere of mean Earth radius

mod types;

pub use types::{Bounds, GeoError, LatLng, MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG};

use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Calculate the great-circle distance between two positions.
///
/// Uses the haversine formula on a spherical Earth.
///
/// # Example
///
/// ```
/// use hillview::geo::{distance_meters, LatLng};
///
/// // 0.01 degrees of longitude on the equator is a little over a kilometre
/// let d = distance_meters(&LatLng::new(0.0, 0.0), &LatLng::new(0.0, 0.01));
/// assert!((d - 1111.95).abs() < 0.5);
/// ```
pub fn distance_meters(from: &LatLng, to: &LatLng) -> f64 {
    let lat1_rad = from.lat * DEG_TO_RAD;
    let lat2_rad = to.lat * DEG_TO_RAD;
    let delta_lat = (to.lat - from.lat) * DEG_TO_RAD;
    let delta_lng = (to.lng - from.lng) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Normalize a bearing to [0, 360) degrees.
///
/// # Example
///
/// ```
/// use hillview::geo::normalize_bearing;
///
/// assert_eq!(normalize_bearing(0.0), 0.0);
/// assert_eq!(normalize_bearing(360.0), 0.0);
/// assert_eq!(normalize_bearing(-90.0), 270.0);
/// assert_eq!(normalize_bearing(450.0), 90.0);
/// ```
pub fn normalize_bearing(bearing: f64) -> f64 {
    let mut b = bearing % 360.0;
    if b < 0.0 {
        b += 360.0;
    }
    // -1e-15 % 360 + 360 rounds to exactly 360.0
    if b >= 360.0 {
        b = 0.0;
    }
    b
}
