//! Camera capture seam.
//!
//! The analysis worker is generic over a [`SampleSource`], so machines
//! without camera hardware (and every test) swap in scripted sources
//! without touching the streaming path. A [`SourceFactory`] opens one
//! source per client connection; dropping the source releases the
//! underlying device.

pub mod synthetic;

pub use synthetic::{SyntheticCamera, SyntheticFactory};

use lockin_core::{CaptureResult, FocusState, Metrics, TrackerConfig};

/// One captured and analyzed camera frame.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Classified focus state before any feature suppression.
    pub state: FocusState,

    /// Reportable measurements, rounded for the wire.
    pub metrics: Metrics,

    /// JPEG-encoded preview bytes, when the source produces them.
    pub preview: Option<Vec<u8>>,
}

/// A camera, or a stand-in for one, yielding analyzed frames.
///
/// `observe` blocks to pace the stream; the worker drives it from a
/// blocking thread, never from the async runtime.
pub trait SampleSource {
    /// Camera index this source was opened with.
    fn camera_id(&self) -> u32;

    /// Captures and analyzes the next frame under the given config
    /// snapshot.
    ///
    /// An `Err` is terminal: the worker reports it downstream and drops
    /// the source without calling `observe` again.
    fn observe(&mut self, config: &TrackerConfig) -> CaptureResult<Observation>;
}

/// Opens one [`SampleSource`] per connection.
pub trait SourceFactory: Send + Sync + 'static {
    type Source: SampleSource + Send;

    /// Opens the camera with the given index.
    fn open(&self, camera_id: u32) -> CaptureResult<Self::Source>;
}
