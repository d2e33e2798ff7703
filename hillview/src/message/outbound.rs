//! Messages delivered to the map UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::photo::{Candidate, RangeCandidate};

/// A fresh result for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosUpdate {
    pub process_id: String,
    pub photos_in_area: Vec<Candidate>,
    pub photos_in_range: Vec<RangeCandidate>,
    pub timestamp: DateTime<Utc>,
}

/// A job or message failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Progress of one source load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingStatus {
    pub source_id: String,
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Every message the core emits, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    PhotosUpdate(PhotosUpdate),
    Error(ErrorReport),
    LoadingStatus(LoadingStatus),
}

impl OutboundMessage {
    pub fn photos_update(
        process_id: impl Into<String>,
        photos_in_area: Vec<Candidate>,
        photos_in_range: Vec<RangeCandidate>,
    ) -> Self {
        OutboundMessage::PhotosUpdate(PhotosUpdate {
            process_id: process_id.into(),
            photos_in_area,
            photos_in_range,
            timestamp: Utc::now(),
        })
    }

    pub fn error(process_id: Option<&str>, error: impl ToString) -> Self {
        OutboundMessage::Error(ErrorReport {
            process_id: process_id.map(str::to_string),
            error: error.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn loading_started(source_id: impl Into<String>) -> Self {
        Self::loading(source_id, true, None, None)
    }

    pub fn loading_finished(source_id: impl Into<String>, count: usize) -> Self {
        Self::loading(source_id, false, Some(format!("loaded {} photos", count)), None)
    }

    pub fn loading_failed(source_id: impl Into<String>, error: impl ToString) -> Self {
        Self::loading(source_id, false, None, Some(error.to_string()))
    }

    fn loading(
        source_id: impl Into<String>,
        is_loading: bool,
        progress: Option<String>,
        error: Option<String>,
    ) -> Self {
        OutboundMessage::LoadingStatus(LoadingStatus {
            source_id: source_id.into(),
            is_loading,
            progress,
            error,
            timestamp: Utc::now(),
        })
    }

    /// Lowercase-first message type, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::PhotosUpdate(_) => "photosUpdate",
            OutboundMessage::Error(_) => "error",
            OutboundMessage::LoadingStatus(_) => "loadingStatus",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OutboundMessage::PhotosUpdate(m) => m.timestamp,
            OutboundMessage::Error(m) => m.timestamp,
            OutboundMessage::LoadingStatus(m) => m.timestamp,
        }
    }

    /// Serializes to a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use serde_json::Value;

    #[test]
    fn test_photos_update_wire_shape() {
        let photo = Candidate::new("1", "dev", LatLng::new(1.0, 2.0), 45.0);
        let ranged = RangeCandidate {
            candidate: photo.clone(),
            distance: 12.5,
        };
        let message = OutboundMessage::photos_update("p", vec![photo], vec![ranged]);

        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "photosUpdate");
        assert_eq!(value["processId"], "p");
        assert_eq!(value["photosInArea"][0]["uid"], "dev:1");
        assert_eq!(value["photosInRange"][0]["distance"], 12.5);
        assert_eq!(value["photosInRange"][0]["bearing"], 45.0);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_loading_status_fields() {
        let done = OutboundMessage::loading_finished("dev", 42);
        let value: Value = serde_json::from_str(&done.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "loadingStatus");
        assert_eq!(value["sourceId"], "dev");
        assert_eq!(value["isLoading"], false);
        assert_eq!(value["progress"], "loaded 42 photos");
        assert!(value.get("error").is_none());

        let failed = OutboundMessage::loading_failed("dev", "boom");
        let value: Value = serde_json::from_str(&failed.to_json().unwrap()).unwrap();
        assert_eq!(value["error"], "boom");
        assert!(value.get("progress").is_none());
    }

    #[test]
    fn test_error_without_process_id() {
        let message = OutboundMessage::error(None, "bad input");
        assert_eq!(message.kind(), "error");
        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(value["error"], "bad input");
        assert!(value.get("processId").is_none());
    }
}
