//! Live connection hubs.
//!
//! Each hub is a single tokio task that owns its client map; callers talk to
//! it through a bounded command inbox. Every client has a bounded outbound
//! queue, and a client whose queue cannot take a message is evicted instead
//! of slowing the hub down.

pub mod connection;
pub mod monitoring_hub;
pub mod student_hub;

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use connection::{serve_socket, ConnectionSettings};
pub use monitoring_hub::MonitoringHub;
pub use student_hub::StudentHub;

/// Serialized JSON frame shared by every recipient of a message.
pub type Frame = Arc<str>;

/// The hub task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("realtime hub is not running")]
pub struct HubClosed;

/// Connection side of a registration: the outbound queue and the token
/// that ends the connection.
#[derive(Debug)]
pub struct ClientSession {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<Frame>,
    pub cancel: CancellationToken,
}

/// Hub side of a registration.
#[derive(Debug)]
struct ClientHandle {
    id: Uuid,
    sender: mpsc::Sender<Frame>,
    cancel: CancellationToken,
}

/// Why a message could not be queued for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryFailure {
    Full,
    Closed,
}

impl DeliveryFailure {
    fn as_str(self) -> &'static str {
        match self {
            DeliveryFailure::Full => "backpressure",
            DeliveryFailure::Closed => "closed",
        }
    }
}

impl ClientHandle {
    /// Creates both ends of a client registration.
    fn pair(buffer: usize) -> (ClientHandle, ClientSession) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        (
            ClientHandle {
                id,
                sender,
                cancel: cancel.clone(),
            },
            ClientSession {
                id,
                receiver,
                cancel,
            },
        )
    }

    fn deliver(&self, frame: &Frame) -> Result<(), DeliveryFailure> {
        self.sender.try_send(frame.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryFailure::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryFailure::Closed,
        })
    }

    /// Ends the connection. Dropping the handle afterwards closes the queue.
    fn close(self) {
        self.cancel.cancel();
    }
}
