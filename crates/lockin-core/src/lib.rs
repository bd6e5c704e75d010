//! LockIn Core - Shared types for camera focus tracking
//!
//! This crate provides the domain types shared between the stream
//! daemon (lockind) and its wire protocol (lockin-protocol).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod analysis;
pub mod config;
pub mod error;
pub mod event;
pub mod state;

// Re-exports for convenience
pub use analysis::{classify, FaceSample, Metrics, ObjectHit, ObjectKind, RawSample};
pub use config::{ConfigEcho, TrackerConfig};
pub use error::{CaptureError, CaptureResult};
pub use event::{AnalysisEvent, FailureEvent};
pub use state::{object_tags, FocusState};
