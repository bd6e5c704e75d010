//! LockIn Daemon - Per-connection camera analysis and event streaming
//!
//! This crate provides the core infrastructure for the lockind daemon:
//! - `capture` - Camera seam producing per-frame observations
//! - `worker` - Blocking analysis loop behind each connection
//! - `server` - TCP server streaming newline-delimited JSON events
//! - `store` - Shared tracker configuration with live updates
//! - `monitor` - Process monitoring for CPU/memory tracking
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       lockind daemon                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │  VisionServer   │────▶│     AnalysisWorker          │   │
//! │  │  (TCP accept)   │     │  (blocking capture loop)    │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │                   │
//! │           │ connections                 │ events            │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │ConnectionSession│◀────│   mpsc::UnboundedSender     │   │
//! │  │  (per client)   │     │   (in capture order)        │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every accepted connection gets its own camera source, config store,
//! worker and event queue; clients never share stream state.
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod capture;
pub mod monitor;
pub mod server;
pub mod settings;
pub mod store;
pub mod worker;
