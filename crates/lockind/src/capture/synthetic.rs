//! Deterministic camera stand-in.
//!
//! Walks a scripted scene through every reportable focus state so the
//! daemon runs end to end on machines without camera hardware. Frames
//! are paced by a plain sleep to approximate a real capture rate.

use std::thread;
use std::time::Duration;

use lockin_core::{
    classify, CaptureResult, FaceSample, Metrics, ObjectHit, ObjectKind, RawSample, TrackerConfig,
};

use super::{Observation, SampleSource, SourceFactory};

/// Frames spent in each scripted phase before advancing.
const FRAMES_PER_PHASE: u64 = 45;

/// Pacing delay between frames, roughly 30 fps.
pub const DEFAULT_FRAME_PERIOD: Duration = Duration::from_millis(33);

/// Minimal JFIF skeleton used as the preview payload.
const PREVIEW_STUB: [u8; 22] = [
    0xFF, 0xD8, // SOI
    0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x00, 0x00, // APP0
    0xFF, 0xD9, // EOI
];

/// One step of the scripted scene.
struct Phase {
    face: Option<FaceSample>,
    volume: Option<f64>,
    object: Option<ObjectHit>,
}

const fn face(h_ratio: f64, v_ratio: f64, left_ear: f64) -> Option<FaceSample> {
    Some(FaceSample {
        h_ratio,
        v_ratio,
        left_ear,
    })
}

const fn hit(kind: ObjectKind) -> Option<ObjectHit> {
    Some(ObjectHit {
        kind,
        confidence: 0.90,
    })
}

/// Scripted scene walked by the synthetic camera.
///
/// One phase per reportable state under the default thresholds:
/// focused, the four off-center gazes, closed eyes, talking, a missing
/// face, then the three object detections. The scene repeats forever.
const SCENE: [Phase; 11] = [
    Phase { face: face(0.50, 0.50, 0.30), volume: Some(0.10), object: None },
    Phase { face: face(0.08, 0.50, 0.30), volume: Some(0.10), object: None },
    Phase { face: face(0.92, 0.50, 0.30), volume: Some(0.10), object: None },
    Phase { face: face(0.50, 0.20, 0.30), volume: Some(0.10), object: None },
    Phase { face: face(0.50, 0.90, 0.30), volume: Some(0.10), object: None },
    Phase { face: face(0.50, 0.50, 0.10), volume: Some(0.10), object: None },
    Phase { face: face(0.50, 0.50, 0.30), volume: Some(0.85), object: None },
    Phase { face: None, volume: Some(0.05), object: None },
    Phase { face: face(0.50, 0.50, 0.30), volume: Some(0.10), object: hit(ObjectKind::Phone) },
    Phase { face: face(0.50, 0.50, 0.30), volume: Some(0.10), object: hit(ObjectKind::Book) },
    Phase { face: face(0.50, 0.50, 0.30), volume: Some(0.10), object: hit(ObjectKind::Other) },
];

/// Deterministic stand-in for a physical camera.
///
/// Never fails to open or read; failure paths are exercised with
/// scripted test sources instead.
pub struct SyntheticCamera {
    camera_id: u32,
    frame_count: u64,
    frame_period: Duration,
}

impl SyntheticCamera {
    /// Creates a camera paced at the default frame period.
    pub fn new(camera_id: u32) -> Self {
        Self::with_frame_period(camera_id, DEFAULT_FRAME_PERIOD)
    }

    /// Creates a camera with a custom pacing delay. `Duration::ZERO`
    /// disables pacing and runs the script flat out.
    pub fn with_frame_period(camera_id: u32, frame_period: Duration) -> Self {
        Self {
            camera_id,
            frame_count: 0,
            frame_period,
        }
    }
}

impl SampleSource for SyntheticCamera {
    fn camera_id(&self) -> u32 {
        self.camera_id
    }

    fn observe(&mut self, config: &TrackerConfig) -> CaptureResult<Observation> {
        if !self.frame_period.is_zero() {
            thread::sleep(self.frame_period);
        }

        let phase = &SCENE[(self.frame_count / FRAMES_PER_PHASE) as usize % SCENE.len()];
        self.frame_count += 1;

        let sample = RawSample {
            face: phase.face,
            volume: phase.volume,
            // The object branch is skipped entirely when detection is
            // toggled off, not just thresholded away.
            object_hit: if config.include_objects {
                phase.object
            } else {
                None
            },
        };

        Ok(Observation {
            state: classify(&sample, config),
            metrics: Metrics::from_sample(&sample),
            preview: Some(PREVIEW_STUB.to_vec()),
        })
    }
}

/// Factory producing [`SyntheticCamera`] sources.
#[derive(Debug, Clone)]
pub struct SyntheticFactory {
    frame_period: Duration,
}

impl SyntheticFactory {
    /// Factory for cameras paced at the default frame period.
    pub fn new() -> Self {
        Self {
            frame_period: DEFAULT_FRAME_PERIOD,
        }
    }

    /// Factory for cameras with a custom pacing delay.
    pub fn with_frame_period(frame_period: Duration) -> Self {
        Self { frame_period }
    }
}

impl Default for SyntheticFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFactory for SyntheticFactory {
    type Source = SyntheticCamera;

    fn open(&self, camera_id: u32) -> CaptureResult<Self::Source> {
        Ok(SyntheticCamera::with_frame_period(
            camera_id,
            self.frame_period,
        ))
    }
}
