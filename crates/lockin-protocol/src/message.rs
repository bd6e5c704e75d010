//! Outbound payload types for the event stream.

use base64::{engine::general_purpose, Engine as _};
use lockin_core::{AnalysisEvent, ConfigEcho, FailureEvent, FocusState, Metrics};
use serde::{Deserialize, Serialize};

/// Fixed `state` value on failure payloads.
pub const CAMERA_ERROR_STATE: &str = "camera-error";

/// One message on the wire, server to client.
///
/// Untagged: clients key on the presence of the `error` field rather
/// than an envelope. `Failure` must stay declared first so serde tries
/// its stricter shape before the laxer `Frame` one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    /// Terminal camera failure; nothing follows it on the stream.
    Failure(FailurePayload),

    /// One analyzed frame.
    Frame(FramePayload),
}

/// Wire form of an analyzed frame.
///
/// The four metric keys are always present, null when unmeasured;
/// `preview_jpeg` and `config` appear only when attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePayload {
    pub state: FocusState,

    #[serde(flatten)]
    pub metrics: Metrics,

    /// Object tags derived from the state label.
    pub objects: Vec<String>,

    pub camera_id: u32,

    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,

    /// Position in the stream, starting at 0.
    pub frame_index: u64,

    pub face_detected: bool,

    /// Base64-encoded JPEG, rate limited upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_jpeg: Option<String>,

    /// Effective-config echo for the frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigEcho>,
}

/// Wire form of a terminal failure. Carries no metric keys at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePayload {
    /// Always [`CAMERA_ERROR_STATE`].
    pub state: String,

    /// Stable failure label, e.g. `camera-read-failed`.
    pub error: String,

    pub objects: Vec<String>,
    pub camera_id: u32,
    pub timestamp_ms: i64,
    pub frame_index: u64,
    pub face_detected: bool,
}

impl StreamPayload {
    /// Builds the wire form of an analyzed frame.
    ///
    /// Preview bytes get base64-encoded here, at the last moment before
    /// serialization.
    pub fn frame(event: &AnalysisEvent) -> Self {
        Self::Frame(FramePayload {
            state: event.state,
            metrics: event.metrics,
            objects: event.objects.iter().map(|tag| tag.to_string()).collect(),
            camera_id: event.camera_id,
            timestamp_ms: event.timestamp_ms,
            frame_index: event.frame_index,
            face_detected: event.face_detected,
            preview_jpeg: event
                .preview_jpeg
                .as_ref()
                .map(|bytes| general_purpose::STANDARD.encode(bytes)),
            config: Some(event.config),
        })
    }

    /// Builds the wire form of a terminal camera failure.
    pub fn failure(event: &FailureEvent) -> Self {
        Self::Failure(FailurePayload {
            state: CAMERA_ERROR_STATE.to_string(),
            error: event.error.wire_label().to_string(),
            objects: Vec::new(),
            camera_id: event.camera_id(),
            timestamp_ms: event.timestamp_ms,
            frame_index: event.frame_index,
            face_detected: false,
        })
    }

    /// True when this payload ends the stream.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Stream position of the payload.
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::Failure(payload) => payload.frame_index,
            Self::Frame(payload) => payload.frame_index,
        }
    }

    /// State label carried by the payload, for logging.
    pub fn state_label(&self) -> &str {
        match self {
            Self::Failure(payload) => &payload.state,
            Self::Frame(payload) => payload.state.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockin_core::{CaptureError, TrackerConfig};

    fn sample_event() -> AnalysisEvent {
        AnalysisEvent {
            state: FocusState::Focused,
            metrics: Metrics {
                h_ratio: Some(0.512),
                v_ratio: Some(0.43),
                left_ear: Some(0.31),
                volume: None,
            },
            objects: Vec::new(),
            camera_id: 0,
            timestamp_ms: 1_712_345_678_901,
            frame_index: 42,
            face_detected: true,
            preview_jpeg: None,
            config: TrackerConfig::default().echo(),
        }
    }

    #[test]
    fn test_frame_serialization() {
        let payload = StreamPayload::frame(&sample_event());
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"state\":\"Focused\""));
        assert!(json.contains("\"frame_index\":42"));
        assert!(json.contains("\"face_detected\":true"));
        assert!(json.contains("\"include_talking\":true"));
        // Unmeasured metrics serialize as null, never disappear.
        assert!(json.contains("\"volume\":null"));
        // No preview was attached, so the key is absent.
        assert!(!json.contains("preview_jpeg"));
    }

    #[test]
    fn test_failure_serialization() {
        let failure = FailureEvent {
            error: CaptureError::ReadFailed {
                camera_id: 0,
                reason: "frame grab failed".into(),
            },
            timestamp_ms: 1_712_345_678_901,
            frame_index: 7,
        };
        let json = serde_json::to_string(&StreamPayload::failure(&failure)).unwrap();
        assert!(json.contains("\"state\":\"camera-error\""));
        assert!(json.contains("\"error\":\"camera-read-failed\""));
        assert!(json.contains("\"face_detected\":false"));
        // Failure payloads carry no metric keys.
        assert!(!json.contains("h_ratio"));
    }

    #[test]
    fn test_preview_encodes_base64() {
        let mut event = sample_event();
        event.preview_jpeg = Some(vec![1, 2, 3]);
        let payload = StreamPayload::frame(&event);
        match payload {
            StreamPayload::Frame(frame) => {
                assert_eq!(frame.preview_jpeg.as_deref(), Some("AQID"));
            }
            other => panic!("Expected Frame, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_roundtrip() {
        let payload = StreamPayload::frame(&sample_event());
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: StreamPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_untagged_variants_disambiguate() {
        // A failure line must come back as Failure, not be swallowed by
        // the laxer Frame shape.
        let json = r#"{"state":"camera-error","error":"camera-init-failed",
            "objects":[],"camera_id":1,"timestamp_ms":1,"frame_index":0,
            "face_detected":false}"#;
        let parsed: StreamPayload = serde_json::from_str(json).unwrap();
        assert!(parsed.is_failure());
        assert_eq!(parsed.frame_index(), 0);

        let json = r#"{"state":"Looking Left","h_ratio":0.1,"v_ratio":null,
            "left_ear":null,"volume":null,"objects":[],"camera_id":0,
            "timestamp_ms":2,"frame_index":9,"face_detected":true}"#;
        let parsed: StreamPayload = serde_json::from_str(json).unwrap();
        assert!(!parsed.is_failure());
        assert_eq!(parsed.frame_index(), 9);
    }

    #[test]
    fn test_object_tags_serialize_as_strings() {
        let mut event = sample_event();
        event.state = FocusState::PhoneDetected;
        event.objects = vec!["phone"];
        let json = serde_json::to_string(&StreamPayload::frame(&event)).unwrap();
        assert!(json.contains("\"objects\":[\"phone\"]"));
        assert!(json.contains("\"state\":\"PHONE DETECTED\""));
    }
}
