//! Shared tracker configuration with live updates.
//!
//! Each client connection owns one `ConfigStore`. The analysis worker
//! snapshots it before every frame and the session applies inbound
//! config messages to it, so an update takes effect on the next frame
//! without tearing the one in flight.

use std::sync::{Arc, Mutex};

use lockin_core::TrackerConfig;
use lockin_protocol::ConfigUpdate;

/// Live-updatable tracker configuration shared between the session and
/// its analysis worker.
///
/// Clones are cheap and all refer to the same value. A poisoned lock is
/// recovered by taking the inner value, so a panicked holder can never
/// wedge the stream.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<Mutex<TrackerConfig>>,
}

impl ConfigStore {
    /// Creates a store holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a coherent snapshot of the current configuration.
    pub fn get(&self) -> TrackerConfig {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Merges a client config update into the stored configuration.
    pub fn apply(&self, update: &ConfigUpdate) {
        let mut config = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        update.apply_to(&mut config);
    }
}
