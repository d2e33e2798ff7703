//! Requests sent by the map UI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{Bounds, GeoError, LatLng};
use crate::photo::SourceConfig;

/// Version of the message protocol this core speaks.
pub const PROTOCOL_VERSION: &str = "1";

/// Priority assigned to a cleanup that omits one.
pub const DEFAULT_PRIORITY: i32 = 10;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// Why an inbound message was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageError {
    #[error("Malformed message: {reason}")]
    Malformed {
        process_id: Option<String>,
        reason: String,
    },

    #[error("Message has an empty processId")]
    EmptyProcessId,

    #[error("Source at index {index} has an empty id")]
    EmptySourceId { process_id: String, index: usize },

    #[error("Invalid bounds: {source}")]
    InvalidBounds {
        process_id: String,
        #[source]
        source: GeoError,
    },

    #[error("Invalid center: {source}")]
    InvalidCenter {
        process_id: String,
        #[source]
        source: GeoError,
    },

    #[error("Invalid range {range}: must be a finite, non-negative number of meters")]
    InvalidRange { process_id: String, range: f64 },

    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        process_id: String,
        expected: String,
        actual: String,
    },
}

impl MessageError {
    /// Process id of the rejected message, when it could be read.
    pub fn process_id(&self) -> Option<&str> {
        match self {
            MessageError::Malformed { process_id, .. } => process_id.as_deref(),
            MessageError::EmptyProcessId => None,
            MessageError::EmptySourceId { process_id, .. }
            | MessageError::InvalidBounds { process_id, .. }
            | MessageError::InvalidCenter { process_id, .. }
            | MessageError::InvalidRange { process_id, .. }
            | MessageError::VersionMismatch { process_id, .. } => Some(process_id),
        }
    }
}

/// A source configuration change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub process_id: String,
    pub priority: i32,
    pub sources: Vec<SourceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,
}

impl ConfigRequest {
    pub fn new(process_id: impl Into<String>, priority: i32, sources: Vec<SourceConfig>) -> Self {
        Self {
            process_id: process_id.into(),
            priority,
            sources,
            expected_version: None,
        }
    }

    /// Checks the fields serde cannot.
    pub fn validate(&self) -> Result<(), MessageError> {
        validate_process_id(&self.process_id)?;
        validate_sources(&self.process_id, &self.sources)?;
        if let Some(version) = &self.expected_version {
            if version != PROTOCOL_VERSION {
                return Err(MessageError::VersionMismatch {
                    process_id: self.process_id.clone(),
                    expected: PROTOCOL_VERSION.to_string(),
                    actual: version.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A viewport change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRequest {
    pub process_id: String,
    pub priority: i32,
    pub sources: Vec<SourceConfig>,
    pub bounds: Bounds,
    /// Area cap; `0` selects the configured default.
    pub max_photos: usize,
    /// Range around the focal point, in meters.
    pub range: f64,
    /// Focal point; the centre of `bounds` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_range_photos: Option<usize>,
}

impl AreaRequest {
    pub fn new(
        process_id: impl Into<String>,
        priority: i32,
        sources: Vec<SourceConfig>,
        bounds: Bounds,
        max_photos: usize,
        range: f64,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            priority,
            sources,
            bounds,
            max_photos,
            range,
            center: None,
            max_range_photos: None,
        }
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_max_range_photos(mut self, max: usize) -> Self {
        self.max_range_photos = Some(max);
        self
    }

    /// The point range culling measures from.
    pub fn focal_point(&self) -> LatLng {
        self.center.unwrap_or_else(|| self.bounds.center())
    }

    /// Checks the fields serde cannot.
    pub fn validate(&self) -> Result<(), MessageError> {
        validate_process_id(&self.process_id)?;
        validate_sources(&self.process_id, &self.sources)?;
        self.bounds
            .validate()
            .map_err(|source| MessageError::InvalidBounds {
                process_id: self.process_id.clone(),
                source,
            })?;
        if let Some(center) = &self.center {
            center
                .validate()
                .map_err(|source| MessageError::InvalidCenter {
                    process_id: self.process_id.clone(),
                    source,
                })?;
        }
        if !self.range.is_finite() || self.range < 0.0 {
            return Err(MessageError::InvalidRange {
                process_id: self.process_id.clone(),
                range: self.range,
            });
        }
        Ok(())
    }
}

/// Request to abort one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortRequest {
    pub process_id: String,
    pub priority: i32,
}

/// Request to abort everything and drop accumulated state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    #[serde(default)]
    pub process_id: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

/// Every message the UI may send, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Config(ConfigRequest),
    Area(AreaRequest),
    Abort(AbortRequest),
    Cleanup(CleanupRequest),
}

impl InboundMessage {
    /// Parses and validates one message.
    ///
    /// On a decode failure the process id is still recovered when the
    /// payload is a JSON object carrying one, so the error can be routed
    /// back to the right request.
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        let message: InboundMessage =
            serde_json::from_str(raw).map_err(|e| MessageError::Malformed {
                process_id: salvage_process_id(raw),
                reason: e.to_string(),
            })?;
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<(), MessageError> {
        match self {
            InboundMessage::Config(req) => req.validate(),
            InboundMessage::Area(req) => req.validate(),
            InboundMessage::Abort(req) => validate_process_id(&req.process_id),
            InboundMessage::Cleanup(_) => Ok(()),
        }
    }

    pub fn process_id(&self) -> &str {
        match self {
            InboundMessage::Config(req) => &req.process_id,
            InboundMessage::Area(req) => &req.process_id,
            InboundMessage::Abort(req) => &req.process_id,
            InboundMessage::Cleanup(req) => &req.process_id,
        }
    }

    pub fn priority(&self) -> i32 {
        match self {
            InboundMessage::Config(req) => req.priority,
            InboundMessage::Area(req) => req.priority,
            InboundMessage::Abort(req) => req.priority,
            InboundMessage::Cleanup(req) => req.priority,
        }
    }

    /// Lowercase message type, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Config(_) => "config",
            InboundMessage::Area(_) => "area",
            InboundMessage::Abort(_) => "abort",
            InboundMessage::Cleanup(_) => "cleanup",
        }
    }
}

fn validate_process_id(process_id: &str) -> Result<(), MessageError> {
    if process_id.trim().is_empty() {
        return Err(MessageError::EmptyProcessId);
    }
    Ok(())
}

fn validate_sources(process_id: &str, sources: &[SourceConfig]) -> Result<(), MessageError> {
    match sources.iter().position(|s| s.id.is_empty()) {
        Some(index) => Err(MessageError::EmptySourceId {
            process_id: process_id.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

fn salvage_process_id(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value
        .get("processId")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::SourceKind;

    const AREA: &str = r#"{
        "type": "area",
        "processId": "a-1",
        "priority": 3,
        "sources": [{"id": "device", "name": "Device", "type": "device", "enabled": true, "color": "red"}],
        "bounds": {"topLeft": {"lat": 50.1, "lng": 14.3}, "bottomRight": {"lat": 50.0, "lng": 14.5}},
        "maxPhotos": 200,
        "range": 1500
    }"#;

    #[test]
    fn test_parse_area() {
        let message = InboundMessage::parse(AREA).unwrap();
        let InboundMessage::Area(area) = &message else {
            panic!("expected area, got {:?}", message);
        };
        assert_eq!(message.process_id(), "a-1");
        assert_eq!(message.priority(), 3);
        assert_eq!(message.kind(), "area");
        assert_eq!(area.max_photos, 200);
        assert_eq!(area.range, 1500.0);
        assert_eq!(area.sources[0].kind, SourceKind::Device);
        assert!(area.center.is_none());
        let focal = area.focal_point();
        assert!((focal.lat - 50.05).abs() < 1e-9);
        assert!((focal.lng - 14.4).abs() < 1e-9);
    }

    #[test]
    fn test_parse_config_abort_cleanup() {
        let config = InboundMessage::parse(
            r#"{"type": "config", "processId": "c", "priority": 1, "sources": [], "expectedVersion": "1"}"#,
        )
        .unwrap();
        assert!(matches!(config, InboundMessage::Config(_)));

        let abort =
            InboundMessage::parse(r#"{"type": "abort", "processId": "a-1", "priority": 4}"#)
                .unwrap();
        assert_eq!(abort.process_id(), "a-1");
        assert_eq!(abort.priority(), 4);

        let cleanup = InboundMessage::parse(r#"{"type": "cleanup"}"#).unwrap();
        assert!(matches!(cleanup, InboundMessage::Cleanup(_)));
        assert_eq!(cleanup.priority(), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_missing_priority_or_cap_is_malformed() {
        let raw = AREA.replace("\"priority\": 3,", "");
        let err = InboundMessage::parse(&raw).unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
        assert_eq!(err.process_id(), Some("a-1"));

        let raw = AREA.replace("\"maxPhotos\": 200,", "");
        let err = InboundMessage::parse(&raw).unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
        assert_eq!(err.process_id(), Some("a-1"));

        let err = InboundMessage::parse(r#"{"type": "abort", "processId": "a-1"}"#).unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
        assert_eq!(err.process_id(), Some("a-1"));
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let err = InboundMessage::parse(r#"{"type": "zoom", "processId": "z"}"#).unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
        assert_eq!(err.process_id(), Some("z"));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = InboundMessage::parse(r#"{"type": "area", "processId": "a", "sources": []}"#)
            .unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
    }

    #[test]
    fn test_not_json_has_no_process_id() {
        let err = InboundMessage::parse("not json").unwrap_err();
        assert_eq!(err.process_id(), None);
    }

    #[test]
    fn test_rejects_empty_process_id() {
        let err = InboundMessage::parse(r#"{"type": "abort", "processId": " ", "priority": 1}"#)
            .unwrap_err();
        assert_eq!(err, MessageError::EmptyProcessId);
    }

    #[test]
    fn test_rejects_negative_range() {
        let raw = AREA.replace("\"range\": 1500", "\"range\": -1");
        let err = InboundMessage::parse(&raw).unwrap_err();
        assert!(matches!(err, MessageError::InvalidRange { .. }));
        assert_eq!(err.process_id(), Some("a-1"));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let raw = AREA.replace("\"lat\": 50.1", "\"lat\": 49.0");
        let err = InboundMessage::parse(&raw).unwrap_err();
        assert!(matches!(err, MessageError::InvalidBounds { .. }));
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let err = InboundMessage::parse(
            r#"{"type": "config", "processId": "c", "priority": 1, "sources": [], "expectedVersion": "0"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MessageError::VersionMismatch { .. }));
    }

    #[test]
    fn test_rejects_empty_source_id() {
        let req = ConfigRequest::new("c", 1, vec![SourceConfig::new("", SourceKind::Stream)]);
        assert!(matches!(
            req.validate(),
            Err(MessageError::EmptySourceId { index: 0, .. })
        ));
    }

    #[test]
    fn test_explicit_center_and_range_cap() {
        let req = AreaRequest::new(
            "a",
            1,
            vec![],
            Bounds::new(LatLng::new(1.0, 0.0), LatLng::new(0.0, 1.0)),
            0,
            10.0,
        )
        .with_center(LatLng::new(0.2, 0.3))
        .with_max_range_photos(7);
        assert!(req.validate().is_ok());
        assert_eq!(req.focal_point(), LatLng::new(0.2, 0.3));

        let json = serde_json::to_string(&InboundMessage::Area(req.clone())).unwrap();
        assert!(json.contains("\"type\":\"area\""));
        assert!(json.contains("\"maxRangePhotos\":7"));
        assert_eq!(InboundMessage::parse(&json).unwrap(), InboundMessage::Area(req));
    }
}
