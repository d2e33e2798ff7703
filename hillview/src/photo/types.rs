//! Photo record and source configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::geo::{normalize_bearing, LatLng};

/// One rendition of a photo (thumbnail, preview, full, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A geo-tagged photo eligible for placement on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Identifier, unique within its source.
    pub id: String,

    /// Key unique within a result set; derived from source and id on ingest.
    #[serde(default)]
    pub uid: String,

    /// Identifier of the source that produced this photo.
    pub source_id: String,

    /// Where the photo was taken.
    pub coord: LatLng,

    /// Camera direction in degrees clockwise from north.
    #[serde(default)]
    pub bearing: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Named renditions, keyed by size label.
    #[serde(default)]
    pub sizes: BTreeMap<String, ImageSize>,

    /// True when the photo lives on this device rather than a remote source.
    #[serde(default)]
    pub is_device_photo: bool,

    /// Capture time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub captured_at: i64,

    /// Record creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

impl Candidate {
    /// Creates a bare candidate with no renditions or timestamps.
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        coord: LatLng,
        bearing: f64,
    ) -> Self {
        let id = id.into();
        let source_id = source_id.into();
        Self {
            uid: derive_uid(&source_id, &id),
            id,
            source_id,
            coord,
            bearing,
            altitude: None,
            sizes: BTreeMap::new(),
            is_device_photo: false,
            captured_at: 0,
            created_at: 0,
            file_hash: None,
        }
    }

    /// Overrides the uid.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    /// Adds a named rendition.
    pub fn with_size(mut self, label: impl Into<String>, size: ImageSize) -> Self {
        self.sizes.insert(label.into(), size);
        self
    }

    /// Returns true if both coordinate components are finite numbers.
    pub fn has_finite_coord(&self) -> bool {
        self.coord.lat.is_finite() && self.coord.lng.is_finite()
    }

    /// Bearing normalized to [0, 360).
    #[inline]
    pub fn normalized_bearing(&self) -> f64 {
        normalize_bearing(self.bearing)
    }

    /// Brings the record into canonical form for a given source.
    ///
    /// The source id is forced to `source_id`, the bearing is normalized and
    /// the uid is derived from source and id.
    pub fn normalize_for(mut self, source_id: &str) -> Self {
        if self.source_id != source_id {
            self.source_id = source_id.to_string();
        }
        self.bearing = if self.bearing.is_finite() {
            normalize_bearing(self.bearing)
        } else {
            0.0
        };
        self.uid = derive_uid(&self.source_id, &self.id);
        self
    }
}

/// Deterministic uid for a photo within a source.
pub fn derive_uid(source_id: &str, id: &str) -> String {
    format!("{}:{}", source_id, id)
}

/// A candidate selected for the range set, with its distance from the focal point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,

    /// Great-circle distance from the focal point in meters.
    pub distance: f64,
}

/// Kind of photo source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Photos stored on this device.
    Device,
    /// Photos fetched from a network service or stream.
    Stream,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Device => write!(f, "device"),
            SourceKind::Stream => write!(f, "stream"),
        }
    }
}

/// Configuration of one photo source as supplied by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub enabled: bool,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Parameterized request templates understood by the loader.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<String>,
}

impl SourceConfig {
    /// Creates an enabled source with no transport parameters.
    pub fn new(id: impl Into<String>, kind: SourceKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            enabled: true,
            color: String::new(),
            url: None,
            subtype: None,
            requests: Vec::new(),
        }
    }

    /// Sets the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the endpoint URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
