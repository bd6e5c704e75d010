//! Per-connection analysis worker.
//!
//! One worker runs behind each client connection on a blocking thread.
//! It owns the camera source for the lifetime of the connection,
//! snapshots the shared config before every frame, and pushes events
//! into the session's queue in capture order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use lockin_core::{AnalysisEvent, FailureEvent, FocusState};

use crate::capture::{SampleSource, SourceFactory};
use crate::store::ConfigStore;

/// Event pushed from the analysis worker to its connection session.
#[derive(Debug)]
pub enum WorkerEvent {
    /// One analyzed frame, ready for the wire.
    Frame(Box<AnalysisEvent>),

    /// Terminal camera failure. At most one per stream, and nothing
    /// but `Closed` follows it.
    Failure(FailureEvent),

    /// End-of-stream marker. Always the last event sent.
    Closed,
}

/// Spawns the analysis worker for one connection.
///
/// The worker stops when the token is cancelled, the camera fails, or
/// the session drops its receiver. The camera source is released
/// before `Closed` goes out.
pub fn spawn_worker<F: SourceFactory>(
    factory: Arc<F>,
    camera_id: u32,
    store: ConfigStore,
    events: UnboundedSender<WorkerEvent>,
    cancel_token: CancellationToken,
    preview_interval: Option<Duration>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        run_stream(
            &*factory,
            camera_id,
            &store,
            &events,
            &cancel_token,
            preview_interval,
        );
    })
}

/// Blocking capture loop for one stream.
fn run_stream<F: SourceFactory>(
    factory: &F,
    camera_id: u32,
    store: &ConfigStore,
    events: &UnboundedSender<WorkerEvent>,
    cancel_token: &CancellationToken,
    preview_interval: Option<Duration>,
) {
    let mut source = match factory.open(camera_id) {
        Ok(source) => source,
        Err(error) => {
            error!(camera_id, %error, "Camera open failed");
            let _ = events.send(WorkerEvent::Failure(FailureEvent::now(error, 0)));
            let _ = events.send(WorkerEvent::Closed);
            return;
        }
    };
    info!(camera_id, "Camera opened, analysis worker running");

    let mut limiter = PreviewLimiter::new(preview_interval);
    let mut frame_index: u64 = 0;

    loop {
        if cancel_token.is_cancelled() {
            debug!(camera_id, "Analysis worker cancelled");
            break;
        }

        let config = store.get();

        let mut observation = match source.observe(&config) {
            Ok(observation) => observation,
            Err(error) => {
                error!(camera_id, frame_index, %error, "Camera read failed");
                let _ = events.send(WorkerEvent::Failure(FailureEvent::now(error, frame_index)));
                break;
            }
        };

        // Suppression happens here, after classification: a disabled
        // feature reads as the neutral state, not as a dropped frame.
        if !config.include_talking && observation.state.is_talking_derived() {
            observation.state = FocusState::Focused;
        }

        let preview_jpeg = if limiter.try_claim(Instant::now()) {
            observation.preview.take()
        } else {
            None
        };

        let event = AnalysisEvent {
            state: observation.state,
            metrics: observation.metrics,
            objects: observation.state.object_tags(),
            camera_id: source.camera_id(),
            timestamp_ms: Utc::now().timestamp_millis(),
            frame_index,
            face_detected: observation.state.face_detected(),
            preview_jpeg,
            config: config.echo(),
        };

        if events.send(WorkerEvent::Frame(Box::new(event))).is_err() {
            debug!(camera_id, frame_index, "Session queue closed, stopping worker");
            break;
        }

        frame_index += 1;
    }

    // Release the device before announcing the end of the stream.
    drop(source);
    let _ = events.send(WorkerEvent::Closed);
    info!(camera_id, frames = frame_index, "Analysis worker stopped");
}

/// Wall-clock rate limiter for preview frames.
///
/// The first claim is always granted. A granted claim advances the
/// window even when the caller ends up attaching no preview bytes.
#[derive(Debug)]
struct PreviewLimiter {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl PreviewLimiter {
    fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true when a preview may be attached at `now`. A limiter
    /// built without an interval never grants.
    fn try_claim(&mut self, now: Instant) -> bool {
        let interval = match self.interval {
            Some(interval) => interval,
            None => return false,
        };

        match self.last {
            Some(last) if now.duration_since(last) < interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
