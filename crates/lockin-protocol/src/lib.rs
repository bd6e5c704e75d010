//! LockIn wire protocol - JSON messages between daemon and client
//!
//! One JSON object per line in both directions. Outbound payloads are
//! flat (the shape dashboards consume directly, no envelope); inbound
//! messages are parsed leniently so a misbehaving client can never
//! wedge its own stream, let alone the daemon.

pub mod message;
pub mod parse;

// Re-exports for convenience
pub use message::{FailurePayload, FramePayload, StreamPayload, CAMERA_ERROR_STATE};
pub use parse::{parse_client_line, ConfigUpdate};
