//! Per-student unicast hub. Each student has at most one live connection.

use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::{ClientHandle, ClientSession, Frame, HubClosed};
use crate::middleware::metrics::{
    record_hub_connections, record_hub_eviction, record_hub_message_sent,
};

const HUB: &str = "student";

enum Command {
    Register {
        student_id: Uuid,
        handle: ClientHandle,
    },
    Unregister {
        student_id: Uuid,
        client_id: Uuid,
    },
    Notify {
        student_id: Uuid,
        frame: Frame,
    },
    ConnectionCount {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the student hub task. Cheap to clone.
#[derive(Clone)]
pub struct StudentHub {
    inbox: mpsc::Sender<Command>,
}

impl StudentHub {
    /// Spawns the hub task on the current runtime.
    pub fn spawn(inbox_size: usize) -> Self {
        let (inbox, commands) = mpsc::channel(inbox_size.max(1));
        tokio::spawn(run(commands));
        Self { inbox }
    }

    /// Registers the live connection of a student, evicting any previous one.
    pub async fn register(
        &self,
        student_id: Uuid,
        buffer: usize,
    ) -> Result<ClientSession, HubClosed> {
        let (handle, session) = ClientHandle::pair(buffer);
        self.inbox
            .send(Command::Register { student_id, handle })
            .await
            .map_err(|_| HubClosed)?;
        Ok(session)
    }

    /// Removes the student's entry only if it still belongs to `client_id`.
    pub async fn unregister(&self, student_id: Uuid, client_id: Uuid) {
        let _ = self
            .inbox
            .send(Command::Unregister {
                student_id,
                client_id,
            })
            .await;
    }

    /// Queues `frame` for the student if connected; otherwise drops it.
    pub async fn notify(&self, student_id: Uuid, frame: Frame) -> Result<(), HubClosed> {
        self.inbox
            .send(Command::Notify { student_id, frame })
            .await
            .map_err(|_| HubClosed)
    }

    pub async fn connection_count(&self) -> Result<usize, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.inbox
            .send(Command::ConnectionCount { reply })
            .await
            .map_err(|_| HubClosed)?;
        rx.await.map_err(|_| HubClosed)
    }
}

async fn run(mut commands: mpsc::Receiver<Command>) {
    let mut clients: HashMap<Uuid, ClientHandle> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register { student_id, handle } => {
                tracing::debug!(student_id = %student_id, client_id = %handle.id, "Student connection registered");
                if let Some(previous) = clients.insert(student_id, handle) {
                    tracing::info!(student_id = %student_id, client_id = %previous.id, "Replacing existing student connection");
                    previous.close();
                    record_hub_eviction(HUB, "replaced");
                }
                record_hub_connections(HUB, clients.len());
            }
            Command::Unregister {
                student_id,
                client_id,
            } => {
                let owned = clients
                    .get(&student_id)
                    .map(|c| c.id == client_id)
                    .unwrap_or(false);
                if owned {
                    if let Some(handle) = clients.remove(&student_id) {
                        handle.close();
                    }
                    tracing::debug!(student_id = %student_id, client_id = %client_id, "Student connection unregistered");
                    record_hub_connections(HUB, clients.len());
                }
            }
            Command::Notify { student_id, frame } => {
                let failure = match clients.get(&student_id) {
                    Some(handle) => handle.deliver(&frame).err(),
                    None => continue,
                };
                match failure {
                    None => record_hub_message_sent(HUB),
                    Some(reason) => {
                        if let Some(handle) = clients.remove(&student_id) {
                            tracing::warn!(student_id = %student_id, client_id = %handle.id, reason = reason.as_str(), "Evicting student connection");
                            handle.close();
                            record_hub_eviction(HUB, reason.as_str());
                            record_hub_connections(HUB, clients.len());
                        }
                    }
                }
            }
            Command::ConnectionCount { reply } => {
                let _ = reply.send(clients.len());
            }
        }
    }

    for (_, handle) in clients.drain() {
        handle.close();
    }
}
