//! TCP stream server for the LockIn daemon.
//!
//! The server:
//! - Listens on `0.0.0.0` at the configured port
//! - Wires every accepted connection to its own analysis worker
//! - Keeps connections fully independent (config, camera, queue)
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  VisionServer   │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionSession│◀────│ AnalysisWorker  │
//! │   (per client)  │queue│  (per client)   │
//! └─────────────────┘     └─────────────────┘
//!         │
//!         │ newline-delimited JSON
//!         ▼
//! ┌─────────────────┐
//! │  Stream client  │
//! └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Accept errors are logged and allow continued operation

mod session;

pub use session::{ConnectionSession, SessionError};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::capture::SourceFactory;
use crate::settings::DaemonSettings;
use crate::store::ConfigStore;
use crate::worker::spawn_worker;

/// TCP server streaming focus analysis to connected clients.
pub struct VisionServer<F> {
    /// Bound listener, created up front so tests can bind port 0.
    listener: TcpListener,

    /// Runtime settings shared by every connection.
    settings: DaemonSettings,

    /// Factory opening one camera source per connection.
    factory: Arc<F>,

    /// Cancellation token for graceful shutdown.
    cancel_token: CancellationToken,

    /// Connection counter for log correlation.
    connection_counter: AtomicU64,

    /// Gauge of currently running sessions, shared with the resource
    /// monitor.
    active_sessions: Arc<AtomicUsize>,
}

impl<F: SourceFactory> VisionServer<F> {
    /// Binds the listener on `0.0.0.0` at the configured port.
    ///
    /// Port 0 picks an ephemeral port; `local_addr` reports the actual
    /// one.
    pub async fn bind(
        settings: DaemonSettings,
        factory: Arc<F>,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr,
                error: e.to_string(),
            })?;

        Ok(Self {
            listener,
            settings,
            factory,
            cancel_token,
            connection_counter: AtomicU64::new(0),
            active_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Shared session-count gauge for the resource monitor.
    pub fn session_gauge(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.active_sessions)
    }

    /// Runs the accept loop.
    ///
    /// Listens for connections until the cancellation token is
    /// triggered. This method does not return until shutdown.
    pub async fn run(&self) {
        info!(
            addr = ?self.local_addr(),
            camera_id = self.settings.camera_id,
            "Stream server listening"
        );

        loop {
            tokio::select! {
                // Check for cancellation
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                // Accept new connection
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let connection =
                                self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(connection, stream, peer);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        info!("Server stopped");
    }

    /// Wires one accepted socket to a fresh worker and session.
    ///
    /// Every connection starts from the default config; updates from
    /// one client never leak into another stream.
    fn handle_connection(&self, connection: u64, stream: TcpStream, peer: SocketAddr) {
        info!(connection, peer = %peer, "Client connected");

        let store = ConfigStore::new();
        let session_token = self.cancel_token.child_token();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let worker = spawn_worker(
            Arc::clone(&self.factory),
            self.settings.camera_id,
            store.clone(),
            event_tx,
            session_token.clone(),
            self.settings.preview_interval(),
        );

        let session = ConnectionSession::new(
            connection,
            peer,
            store,
            session_token,
            self.settings.log_every,
        );

        let active_sessions = Arc::clone(&self.active_sessions);
        active_sessions.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            session.run(stream, event_rx).await;

            // The session cancelled the shared token on its way out;
            // joining the worker here guarantees the camera is released
            // before the connection counts as gone.
            let _ = worker.await;
            active_sessions.fetch_sub(1, Ordering::SeqCst);
            debug!(connection, "Connection resources released");
        });
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticFactory;
    use std::time::Duration;

    #[test]
    fn test_server_error_display() {
        let err = ServerError::Bind {
            addr: SocketAddr::from(([0, 0, 0, 0], 8765)),
            error: "address in use".to_string(),
        };
        assert!(err.to_string().contains("8765"));
        assert!(err.to_string().contains("address in use"));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let settings = DaemonSettings {
            port: 0,
            ..DaemonSettings::default()
        };
        let server = VisionServer::bind(
            settings,
            Arc::new(SyntheticFactory::with_frame_period(Duration::ZERO)),
            CancellationToken::new(),
        )
        .await
        .expect("bind ephemeral port");

        let addr = server.local_addr().expect("bound address");
        assert_ne!(addr.port(), 0);
        assert_eq!(server.session_gauge().load(Ordering::SeqCst), 0);
    }
}
