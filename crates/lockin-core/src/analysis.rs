//! Per-frame classification from raw sensor readings.
//!
//! A sample source reduces whatever it measures to a [`RawSample`];
//! [`classify`] turns that into a [`FocusState`] using the live
//! [`TrackerConfig`] snapshot. Keeping the thresholding here, away from
//! the capture backends, means one classifier serves the real camera,
//! the synthetic source, and the scripted test sources alike.

use crate::config::TrackerConfig;
use crate::state::FocusState;
use serde::{Deserialize, Serialize};

/// Face landmarks reduced to the three ratios the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSample {
    /// Horizontal iris position, 0.0 (far left) to 1.0 (far right).
    pub h_ratio: f64,
    /// Vertical iris position, 0.0 (top) to 1.0 (bottom).
    pub v_ratio: f64,
    /// Eye aspect ratio of the left eye.
    pub left_ear: f64,
}

/// Object classes the detector distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Phone,
    Book,
    /// Anything else the detector flags as a distraction.
    Other,
}

/// Strongest object-detector candidate in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectHit {
    pub kind: ObjectKind,
    pub confidence: f64,
}

/// One un-thresholded sensor readout.
///
/// `None` fields mean the corresponding branch produced nothing this
/// frame (no face found, no audio device, detection skipped).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawSample {
    pub face: Option<FaceSample>,
    pub volume: Option<f64>,
    pub object_hit: Option<ObjectHit>,
}

/// Nullable per-frame measurements reported alongside the state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub h_ratio: Option<f64>,
    pub v_ratio: Option<f64>,
    pub left_ear: Option<f64>,
    pub volume: Option<f64>,
}

impl Metrics {
    /// Extracts reportable measurements from a raw readout.
    ///
    /// Values are rounded to three decimals so the wire form stays
    /// stable across capture backends.
    pub fn from_sample(sample: &RawSample) -> Self {
        Self {
            h_ratio: sample.face.map(|f| round3(f.h_ratio)),
            v_ratio: sample.face.map(|f| round3(f.v_ratio)),
            left_ear: sample.face.map(|f| round3(f.left_ear)),
            volume: sample.volume.map(round3),
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Classifies one raw readout against a config snapshot.
///
/// Priority order, highest last:
/// 1. face orientation (horizontal band first, then vertical)
/// 2. eye closure overrides orientation
/// 3. a confident object hit overrides any face state
/// 4. volume over the audio floor reads as Talking, but only from the
///    neutral state; a distraction finding is never masked by speech
pub fn classify(sample: &RawSample, cfg: &TrackerConfig) -> FocusState {
    let mut state = match sample.face {
        Some(face) => face_state(&face, cfg),
        None => FocusState::NoFaceDetected,
    };

    if let Some(hit) = sample.object_hit {
        if hit.confidence > cfg.conf_threshold {
            state = match hit.kind {
                ObjectKind::Phone => FocusState::PhoneDetected,
                ObjectKind::Book => FocusState::BookDetected,
                ObjectKind::Other => FocusState::DistractionDetected,
            };
        }
    }

    if state == FocusState::Focused {
        if let Some(volume) = sample.volume {
            if volume > cfg.audio_threshold {
                state = FocusState::Talking;
            }
        }
    }

    state
}

fn face_state(face: &FaceSample, cfg: &TrackerConfig) -> FocusState {
    let mut state = if face.h_ratio < cfg.h_min {
        FocusState::LookingLeft
    } else if face.h_ratio > cfg.h_max {
        FocusState::LookingRight
    } else if face.v_ratio < cfg.v_min {
        FocusState::LookingUp
    } else if face.v_ratio > cfg.v_max {
        FocusState::LookingDown
    } else {
        FocusState::Focused
    };

    if face.left_ear < cfg.ear_threshold {
        state = FocusState::EyesClosed;
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centered_face() -> FaceSample {
        FaceSample {
            h_ratio: 0.5,
            v_ratio: 0.5,
            left_ear: 0.3,
        }
    }

    fn sample_with_face(face: FaceSample) -> RawSample {
        RawSample {
            face: Some(face),
            ..RawSample::default()
        }
    }

    #[test]
    fn test_centered_face_is_focused() {
        let cfg = TrackerConfig::default();
        let state = classify(&sample_with_face(centered_face()), &cfg);
        assert_eq!(state, FocusState::Focused);
    }

    #[test]
    fn test_horizontal_band_edges() {
        let cfg = TrackerConfig::default();
        let left = FaceSample {
            h_ratio: 0.1,
            ..centered_face()
        };
        let right = FaceSample {
            h_ratio: 0.9,
            ..centered_face()
        };
        assert_eq!(
            classify(&sample_with_face(left), &cfg),
            FocusState::LookingLeft
        );
        assert_eq!(
            classify(&sample_with_face(right), &cfg),
            FocusState::LookingRight
        );
    }

    #[test]
    fn test_horizontal_wins_over_vertical() {
        let cfg = TrackerConfig::default();
        let face = FaceSample {
            h_ratio: 0.1,
            v_ratio: 0.1,
            left_ear: 0.3,
        };
        assert_eq!(
            classify(&sample_with_face(face), &cfg),
            FocusState::LookingLeft
        );
    }

    #[test]
    fn test_vertical_band_edges() {
        let cfg = TrackerConfig::default();
        let up = FaceSample {
            v_ratio: 0.1,
            ..centered_face()
        };
        let down = FaceSample {
            v_ratio: 0.9,
            ..centered_face()
        };
        assert_eq!(classify(&sample_with_face(up), &cfg), FocusState::LookingUp);
        assert_eq!(
            classify(&sample_with_face(down), &cfg),
            FocusState::LookingDown
        );
    }

    #[test]
    fn test_eye_closure_overrides_orientation() {
        let cfg = TrackerConfig::default();
        let face = FaceSample {
            h_ratio: 0.1,
            v_ratio: 0.5,
            left_ear: 0.1,
        };
        assert_eq!(
            classify(&sample_with_face(face), &cfg),
            FocusState::EyesClosed
        );
    }

    #[test]
    fn test_missing_face() {
        let cfg = TrackerConfig::default();
        assert_eq!(
            classify(&RawSample::default(), &cfg),
            FocusState::NoFaceDetected
        );
    }

    #[test]
    fn test_confident_object_overrides_face_state() {
        let cfg = TrackerConfig::default();
        let sample = RawSample {
            face: Some(centered_face()),
            object_hit: Some(ObjectHit {
                kind: ObjectKind::Phone,
                confidence: 0.9,
            }),
            ..RawSample::default()
        };
        assert_eq!(classify(&sample, &cfg), FocusState::PhoneDetected);
    }

    #[test]
    fn test_object_overrides_missing_face() {
        let cfg = TrackerConfig::default();
        let sample = RawSample {
            object_hit: Some(ObjectHit {
                kind: ObjectKind::Other,
                confidence: 0.8,
            }),
            ..RawSample::default()
        };
        assert_eq!(classify(&sample, &cfg), FocusState::DistractionDetected);
    }

    #[test]
    fn test_low_confidence_object_ignored() {
        let cfg = TrackerConfig::default();
        let sample = RawSample {
            face: Some(centered_face()),
            object_hit: Some(ObjectHit {
                kind: ObjectKind::Book,
                confidence: 0.3,
            }),
            ..RawSample::default()
        };
        assert_eq!(classify(&sample, &cfg), FocusState::Focused);
    }

    #[test]
    fn test_talking_from_neutral_only() {
        let cfg = TrackerConfig::default();
        let loud = RawSample {
            face: Some(centered_face()),
            volume: Some(0.8),
            ..RawSample::default()
        };
        assert_eq!(classify(&loud, &cfg), FocusState::Talking);

        // Speech never masks a distraction finding.
        let loud_with_phone = RawSample {
            object_hit: Some(ObjectHit {
                kind: ObjectKind::Phone,
                confidence: 0.9,
            }),
            ..loud
        };
        assert_eq!(classify(&loud_with_phone, &cfg), FocusState::PhoneDetected);
    }

    #[test]
    fn test_quiet_volume_stays_focused() {
        let cfg = TrackerConfig::default();
        let sample = RawSample {
            face: Some(centered_face()),
            volume: Some(0.2),
            ..RawSample::default()
        };
        assert_eq!(classify(&sample, &cfg), FocusState::Focused);
    }

    #[test]
    fn test_reconfigured_band_flips_classification() {
        let face = FaceSample {
            h_ratio: 0.1,
            ..centered_face()
        };
        let sample = sample_with_face(face);

        let defaults = TrackerConfig::default();
        assert_eq!(classify(&sample, &defaults), FocusState::LookingLeft);

        let widened = TrackerConfig {
            h_min: 0.05,
            ..defaults
        };
        assert_eq!(classify(&sample, &widened), FocusState::Focused);
    }

    #[test]
    fn test_metrics_round_to_three_decimals() {
        let sample = RawSample {
            face: Some(FaceSample {
                h_ratio: 0.51234,
                v_ratio: 0.43999,
                left_ear: 0.30001,
            }),
            volume: Some(0.12345),
            ..RawSample::default()
        };
        let metrics = Metrics::from_sample(&sample);
        assert_eq!(metrics.h_ratio, Some(0.512));
        assert_eq!(metrics.v_ratio, Some(0.44));
        assert_eq!(metrics.left_ear, Some(0.3));
        assert_eq!(metrics.volume, Some(0.123));
    }

    #[test]
    fn test_metrics_null_without_face() {
        let metrics = Metrics::from_sample(&RawSample {
            volume: Some(0.5),
            ..RawSample::default()
        });
        assert_eq!(metrics.h_ratio, None);
        assert_eq!(metrics.v_ratio, None);
        assert_eq!(metrics.left_ear, None);
        assert_eq!(metrics.volume, Some(0.5));
    }
}
