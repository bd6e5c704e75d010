//! Stream event records pushed from the analysis loop to the session.
//!
//! These are the fixed-schema domain records; `lockin-protocol` owns
//! their wire form.

use crate::analysis::Metrics;
use crate::config::ConfigEcho;
use crate::error::CaptureError;
use crate::state::FocusState;
use chrono::Utc;

/// One analyzed frame, ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEvent {
    /// State after feature suppression has been applied.
    pub state: FocusState,
    pub metrics: Metrics,
    /// Object tags derived from the state label.
    pub objects: Vec<&'static str>,
    pub camera_id: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Position in the stream, starting at 0, no gaps.
    pub frame_index: u64,
    pub face_detected: bool,
    /// Encoded JPEG bytes, present only on frames the rate limiter
    /// granted a preview.
    pub preview_jpeg: Option<Vec<u8>>,
    /// Config slice that produced this frame.
    pub config: ConfigEcho,
}

/// Terminal camera failure notice.
///
/// At most one of these ends a stream; nothing follows it except the
/// closing sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureEvent {
    pub error: CaptureError,
    pub timestamp_ms: i64,
    /// Index the next frame would have carried.
    pub frame_index: u64,
}

impl FailureEvent {
    /// Stamps a failure with the current wall-clock time.
    pub fn now(error: CaptureError, frame_index: u64) -> Self {
        Self {
            error,
            timestamp_ms: Utc::now().timestamp_millis(),
            frame_index,
        }
    }

    /// Device index the failure came from.
    pub fn camera_id(&self) -> u32 {
        self.error.camera_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_event_carries_device_index() {
        let event = FailureEvent::now(
            CaptureError::ReadFailed {
                camera_id: 3,
                reason: "frame grab failed".into(),
            },
            17,
        );
        assert_eq!(event.camera_id(), 3);
        assert_eq!(event.frame_index, 17);
        assert!(event.timestamp_ms > 0);
    }
}
