//! Capture error taxonomy following panic-free policy.

use thiserror::Error;

/// Errors surfaced by a sample source.
///
/// Both variants are terminal for the stream that hit them: the analysis
/// loop reports exactly one failure event downstream and stops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Device could not be opened at startup.
    #[error("camera {camera_id} failed to initialize: {reason}")]
    InitFailed { camera_id: u32, reason: String },

    /// Device stopped producing frames mid-stream.
    #[error("camera {camera_id} failed to read a frame: {reason}")]
    ReadFailed { camera_id: u32, reason: String },
}

impl CaptureError {
    /// Stable label carried in the `error` field of failure payloads.
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::InitFailed { .. } => "camera-init-failed",
            Self::ReadFailed { .. } => "camera-read-failed",
        }
    }

    /// Device index the failure came from.
    pub fn camera_id(&self) -> u32 {
        match self {
            Self::InitFailed { camera_id, .. } | Self::ReadFailed { camera_id, .. } => *camera_id,
        }
    }
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
