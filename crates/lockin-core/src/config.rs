//! Hot-reloadable analysis configuration.

use serde::{Deserialize, Serialize};

/// Analysis thresholds and feature toggles for one stream.
///
/// A plain copyable value. The daemon keeps one behind a lock per
/// connection and hands coherent snapshots to the analysis loop, so a
/// mid-frame update never produces a torn read.
///
/// Values are applied exactly as the client sent them: a band with
/// `h_min > h_max` is not rejected, classification simply follows the
/// configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Horizontal gaze ratio below this reads as Looking Left.
    pub h_min: f64,
    /// Horizontal gaze ratio above this reads as Looking Right.
    pub h_max: f64,
    /// Vertical gaze ratio below this reads as Looking Up.
    pub v_min: f64,
    /// Vertical gaze ratio above this reads as Looking Down.
    pub v_max: f64,
    /// Eye aspect ratio below this counts as eyes closed.
    pub ear_threshold: f64,
    /// Minimum detector confidence for an object hit to count.
    pub conf_threshold: f64,
    /// Volume above this counts as talking.
    pub audio_threshold: f64,
    /// Report audio-derived talking states.
    pub include_talking: bool,
    /// Run object detection at all.
    pub include_objects: bool,
}

impl TrackerConfig {
    /// The slice of the config that gets echoed back to clients.
    pub fn echo(&self) -> ConfigEcho {
        ConfigEcho {
            include_talking: self.include_talking,
            audio_threshold: self.audio_threshold,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            h_min: 0.20,
            h_max: 0.80,
            v_min: 0.39,
            v_max: 0.70,
            ear_threshold: 0.25,
            conf_threshold: 0.50,
            audio_threshold: 0.50,
            include_talking: true,
            include_objects: true,
        }
    }
}

/// Effective-config slice attached to outgoing analysis payloads.
///
/// Lets a client confirm which toggles produced the events it is seeing
/// without a separate acknowledgement message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigEcho {
    pub include_talking: bool,
    pub audio_threshold: f64,
}
