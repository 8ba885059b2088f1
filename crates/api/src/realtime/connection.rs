//! Socket pumps shared by both hubs.
//!
//! The writer task drains the client's outbound queue and sends pings; the
//! reader enforces the read deadline. Either side cancels the shared token
//! when it stops, which ends the other.

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{ClientSession, Frame};
use crate::config::RealtimeConfig;

/// Liveness and size limits for one connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub ping_interval: Duration,
    pub max_message_bytes: usize,
}

impl From<&RealtimeConfig> for ConnectionSettings {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            ping_interval: config.ping_interval(),
            max_message_bytes: config.max_message_bytes,
        }
    }
}

/// Runs a registered connection until either side stops.
///
/// Returns after the reader has finished and the writer task has closed the
/// socket; the caller then unregisters the client from its hub.
pub async fn serve_socket(socket: WebSocket, session: ClientSession, settings: ConnectionSettings) {
    let ClientSession {
        id,
        receiver,
        cancel,
    } = session;
    let (sink, stream) = socket.split();

    let writer = tokio::spawn(write_pump(sink, receiver, cancel.clone(), settings, id));
    read_pump(stream, cancel.clone(), settings, id).await;
    cancel.cancel();

    if let Err(e) = writer.await {
        tracing::warn!(client_id = %id, error = %e, "Socket writer task failed");
    }
}

async fn read_pump(
    mut stream: SplitStream<WebSocket>,
    cancel: CancellationToken,
    settings: ConnectionSettings,
    client_id: Uuid,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = timeout(settings.read_timeout, stream.next()) => next,
        };

        match next {
            Err(_) => {
                tracing::debug!(client_id = %client_id, "Read deadline exceeded");
                break;
            }
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!(client_id = %client_id, error = %e, "Socket read failed");
                break;
            }
            Ok(Some(Ok(message))) => {
                if inbound_len(&message) > settings.max_message_bytes {
                    tracing::debug!(client_id = %client_id, "Inbound frame too large");
                    break;
                }
                // Clients only send pongs and keepalives; any frame refreshes the deadline.
            }
        }
    }

    cancel.cancel();
}

async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut receiver: mpsc::Receiver<Frame>,
    cancel: CancellationToken,
    settings: ConnectionSettings,
    client_id: Uuid,
) {
    let mut ping = interval_at(Instant::now() + settings.ping_interval, settings.ping_interval);

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = receiver.recv() => match frame {
                Some(frame) => Message::Text(frame.to_string()),
                // The hub dropped our queue: evicted or replaced.
                None => break,
            },
            _ = ping.tick() => Message::Ping(Vec::new()),
        };

        match timeout(settings.write_timeout, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(client_id = %client_id, error = %e, "Socket write failed");
                break;
            }
            Err(_) => {
                tracing::debug!(client_id = %client_id, "Socket write timed out");
                break;
            }
        }
    }

    cancel.cancel();
    let _ = timeout(settings.write_timeout, sink.send(Message::Close(None))).await;
    let _ = timeout(settings.write_timeout, sink.close()).await;
}

fn inbound_len(message: &Message) -> usize {
    match message {
        Message::Text(text) => text.len(),
        Message::Binary(data) | Message::Ping(data) | Message::Pong(data) => data.len(),
        Message::Close(_) => 0,
    }
}
