//! Geographic type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Degrees north (-90 to 90)
    pub lat: f64,
    /// Degrees east (-180 to 180)
    pub lng: f64,
}

impl LatLng {
    /// Creates a new coordinate without validation.
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns the coordinate as a `(lat, lng)` tuple.
    #[inline]
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    /// Checks that both components are finite and inside the valid ranges.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(GeoError::InvalidLatitude(self.lat));
        }
        if !self.lng.is_finite() || !(MIN_LNG..=MAX_LNG).contains(&self.lng) {
            return Err(GeoError::InvalidLongitude(self.lng));
        }
        Ok(())
    }
}

/// A map viewport described by its north-west and south-east corners.
///
/// When `top_left.lng` is greater than `bottom_right.lng` the rectangle
/// wraps across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// North-west corner
    pub top_left: LatLng,
    /// South-east corner
    pub bottom_right: LatLng,
}

impl Bounds {
    /// Creates bounds from the two corners without validation.
    pub const fn new(top_left: LatLng, bottom_right: LatLng) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Validates both corners and their vertical ordering.
    pub fn validate(&self) -> Result<(), GeoError> {
        self.top_left.validate()?;
        self.bottom_right.validate()?;
        if self.top_left.lat < self.bottom_right.lat {
            return Err(GeoError::InvertedBounds {
                north: self.top_left.lat,
                south: self.bottom_right.lat,
            });
        }
        Ok(())
    }

    /// Returns true if the viewport wraps across the antimeridian.
    #[inline]
    pub fn crosses_antimeridian(&self) -> bool {
        self.top_left.lng > self.bottom_right.lng
    }

    /// North-south extent in degrees.
    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.top_left.lat - self.bottom_right.lat
    }

    /// East-west extent in degrees, accounting for antimeridian wrap.
    #[inline]
    pub fn lng_span(&self) -> f64 {
        let span = self.bottom_right.lng - self.top_left.lng;
        if span < 0.0 {
            span + 360.0
        } else {
            span
        }
    }

    /// Eastward offset of `lng` from the western edge, in degrees.
    ///
    /// Longitudes west of the viewport on a wrapping rectangle come out
    /// greater than [`Bounds::lng_span`].
    #[inline]
    pub fn lng_offset(&self, lng: f64) -> f64 {
        let offset = lng - self.top_left.lng;
        if self.crosses_antimeridian() && offset < 0.0 {
            offset + 360.0
        } else {
            offset
        }
    }

    /// Geometric centre of the viewport.
    pub fn center(&self) -> LatLng {
        let lat = self.bottom_right.lat + self.lat_span() / 2.0;
        let mut lng = self.top_left.lng + self.lng_span() / 2.0;
        if lng > MAX_LNG {
            lng -= 360.0;
        }
        LatLng::new(lat, lng)
    }

    /// Returns true if the coordinate lies inside the viewport (edges inclusive).
    pub fn contains(&self, point: &LatLng) -> bool {
        if point.lat > self.top_left.lat || point.lat < self.bottom_right.lat {
            return false;
        }
        let offset = self.lng_offset(point.lng);
        (0.0..=self.lng_span()).contains(&offset)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.5}, {:.5}) -> ({:.5}, {:.5})",
            self.top_left.lat, self.top_left.lng, self.bottom_right.lat, self.bottom_right.lng
        )
    }
}

/// Errors produced when validating geographic input.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude is non-finite or outside -90..=90
    InvalidLatitude(f64),
    /// Longitude is non-finite or outside -180..=180
    InvalidLongitude(f64),
    /// Top-left corner lies south of the bottom-right corner
    InvertedBounds { north: f64, south: f64 },
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidLatitude(lat) => write!(
                f,
                "Invalid latitude: {} (must be between {} and {})",
                lat, MIN_LAT, MAX_LAT
            ),
            GeoError::InvalidLongitude(lng) => write!(
                f,
                "Invalid longitude: {} (must be between {} and {})",
                lng, MIN_LNG, MAX_LNG
            ),
            GeoError::InvertedBounds { north, south } => write!(
                f,
                "Invalid bounds: top-left latitude {} is south of bottom-right latitude {}",
                north, south
            ),
        }
    }
}

impl std::error::Error for GeoError {}
