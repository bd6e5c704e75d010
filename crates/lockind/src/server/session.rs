//! Per-connection stream session.
//!
//! Each accepted socket is driven by two halves: an outbound task that
//! serializes worker events as newline-delimited JSON, and an inbound
//! loop that applies client config messages to the shared store. Either
//! half ending cancels the other through the session's token, which
//! also stops the analysis worker behind the connection.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lockin_protocol::{parse_client_line, StreamPayload};

use crate::store::ConfigStore;
use crate::worker::WorkerEvent;

/// Maximum message size (1 MB)
const MAX_MESSAGE_SIZE: usize = 1_048_576;

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Session for a single client connection.
///
/// Owns the inbound half of the socket directly; the outbound half is
/// handed to a spawned writer task together with the event queue. There
/// is deliberately no read timeout: a client that only ever listens is
/// a perfectly healthy client.
pub struct ConnectionSession {
    /// Connection number assigned by the accept loop.
    connection: u64,

    /// Peer address, for logging only.
    peer: SocketAddr,

    /// Config store shared with the analysis worker.
    store: ConfigStore,

    /// Token linking the session, its writer task and its worker.
    cancel_token: CancellationToken,

    /// Payloads between throughput log lines. Zero disables the log.
    log_every: u64,
}

impl ConnectionSession {
    /// Creates a session for one accepted connection.
    pub fn new(
        connection: u64,
        peer: SocketAddr,
        store: ConfigStore,
        cancel_token: CancellationToken,
        log_every: u64,
    ) -> Self {
        Self {
            connection,
            peer,
            store,
            cancel_token,
            log_every,
        }
    }

    /// Drives the session until the stream ends or the client leaves.
    ///
    /// Returns after both socket halves are finished; the caller still
    /// owns joining the worker.
    pub async fn run(self, stream: TcpStream, events: UnboundedReceiver<WorkerEvent>) {
        let (read_half, write_half) = stream.into_split();

        let writer_token = self.cancel_token.clone();
        let connection = self.connection;
        let log_every = self.log_every;
        let outbound = tokio::spawn(async move {
            let sent = stream_events(
                BufWriter::new(write_half),
                events,
                &writer_token,
                connection,
                log_every,
            )
            .await;
            // The stream is over; pull the inbound loop down with it.
            writer_token.cancel();
            sent
        });

        self.read_config_messages(BufReader::new(read_half)).await;
        self.cancel_token.cancel();

        let events_sent = outbound.await.unwrap_or(0);
        info!(
            connection = self.connection,
            peer = %self.peer,
            events_sent,
            "Stream session closed"
        );
    }

    /// Inbound loop: applies config messages, ignores everything else.
    async fn read_config_messages(&self, mut reader: BufReader<OwnedReadHalf>) {
        let mut line = String::new();

        loop {
            line.clear();

            let read = tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => break,

                read = reader.read_line(&mut line) => read,
            };

            match read {
                Ok(0) => {
                    info!(
                        connection = self.connection,
                        peer = %self.peer,
                        "Client disconnected"
                    );
                    break;
                }
                Ok(_) if line.len() > MAX_MESSAGE_SIZE => {
                    warn!(
                        connection = self.connection,
                        size = line.len(),
                        max = MAX_MESSAGE_SIZE,
                        "Inbound message too large, closing session"
                    );
                    break;
                }
                Ok(_) => match parse_client_line(&line) {
                    Some(update) => {
                        self.store.apply(&update);
                        info!(
                            connection = self.connection,
                            fields = ?update.field_names(),
                            "Applied config update"
                        );
                    }
                    None => {
                        debug!(
                            connection = self.connection,
                            "Ignoring unrecognized client message"
                        );
                    }
                },
                Err(e) => {
                    info!(
                        connection = self.connection,
                        error = %e,
                        "Client read failed"
                    );
                    break;
                }
            }
        }
    }
}

/// Outbound loop: drains the event queue onto the socket in order.
///
/// Returns the number of payloads written.
async fn stream_events(
    mut writer: BufWriter<OwnedWriteHalf>,
    mut events: UnboundedReceiver<WorkerEvent>,
    cancel_token: &CancellationToken,
    connection: u64,
    log_every: u64,
) -> u64 {
    let mut sent: u64 = 0;
    let mut window_start = Instant::now();

    loop {
        let event = tokio::select! {
            biased;

            _ = cancel_token.cancelled() => break,

            event = events.recv() => event,
        };

        let payload = match event {
            Some(WorkerEvent::Frame(frame)) => StreamPayload::frame(&frame),
            Some(WorkerEvent::Failure(failure)) => StreamPayload::failure(&failure),
            Some(WorkerEvent::Closed) | None => break,
        };

        if let Err(e) = send_payload(&mut writer, &payload).await {
            info!(connection, error = %e, "Client write failed, closing session");
            break;
        }

        if sent == 0 {
            info!(
                connection,
                state = payload.state_label(),
                frame_index = payload.frame_index(),
                "First payload sent"
            );
        }
        sent += 1;

        if log_every > 0 && sent % log_every == 0 {
            let elapsed = window_start.elapsed().as_secs_f64().max(1e-6);
            let rate = log_every as f64 / elapsed;
            info!(
                connection,
                sent,
                rate = format!("{rate:.1}"),
                "Stream throughput"
            );
            window_start = Instant::now();
        }
    }

    sent
}

/// Sends one payload as a newline-terminated JSON line.
async fn send_payload(
    writer: &mut BufWriter<OwnedWriteHalf>,
    payload: &StreamPayload,
) -> Result<(), SessionError> {
    let json =
        serde_json::to_string(payload).map_err(|e| SessionError::Serialize(e.to_string()))?;

    match timeout(WRITE_TIMEOUT, async {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok::<(), std::io::Error>(())
    })
    .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Io(e.to_string())),
        Err(_) => Err(SessionError::WriteTimeout),
    }
}

/// Errors that can occur while streaming to a client.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to serialize payload: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Write timeout")]
    WriteTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_display() {
        let err = SessionError::Io("broken pipe".to_string());
        assert!(err.to_string().contains("broken pipe"));

        let err = SessionError::Serialize("bad value".to_string());
        assert!(err.to_string().contains("serialize"));
    }

    #[test]
    fn test_constants() {
        assert_eq!(MAX_MESSAGE_SIZE, 1_048_576);
        assert_eq!(WRITE_TIMEOUT, Duration::from_secs(10));
    }
}
