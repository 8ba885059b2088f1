//! Room-scoped broadcast hub for supervisor and admin dashboards.

use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use domain::services::RoomScope;

use super::{ClientHandle, ClientSession, Frame, HubClosed};
use crate::middleware::metrics::{
    record_hub_connections, record_hub_eviction, record_hub_message_sent,
};

const HUB: &str = "monitoring";

enum Command {
    Register {
        handle: ClientHandle,
        scope: RoomScope,
    },
    Unregister {
        client_id: Uuid,
    },
    Broadcast {
        room_id: Option<Uuid>,
        frame: Frame,
    },
    ConnectionCount {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the monitoring hub task. Cheap to clone.
#[derive(Clone)]
pub struct MonitoringHub {
    inbox: mpsc::Sender<Command>,
}

impl MonitoringHub {
    /// Spawns the hub task on the current runtime.
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn(inbox_size: usize) -> Self {
        let (inbox, commands) = mpsc::channel(inbox_size.max(1));
        tokio::spawn(run(commands));
        Self { inbox }
    }

    /// Registers a viewer that receives snapshots for rooms in `scope`.
    pub async fn register(
        &self,
        scope: RoomScope,
        buffer: usize,
    ) -> Result<ClientSession, HubClosed> {
        let (handle, session) = ClientHandle::pair(buffer);
        self.inbox
            .send(Command::Register { handle, scope })
            .await
            .map_err(|_| HubClosed)?;
        Ok(session)
    }

    /// Removes a viewer. Unknown ids are ignored.
    pub async fn unregister(&self, client_id: Uuid) {
        let _ = self.inbox.send(Command::Unregister { client_id }).await;
    }

    /// Queues `frame` for every viewer whose scope covers `room_id`.
    ///
    /// A roomless snapshot only reaches unrestricted viewers.
    pub async fn broadcast(&self, room_id: Option<Uuid>, frame: Frame) -> Result<(), HubClosed> {
        self.inbox
            .send(Command::Broadcast { room_id, frame })
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

struct Viewer {
    handle: ClientHandle,
    scope: RoomScope,
}

async fn run(mut commands: mpsc::Receiver<Command>) {
    let mut viewers: HashMap<Uuid, Viewer> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register { handle, scope } => {
                tracing::debug!(client_id = %handle.id, all_rooms = scope.is_all(), "Monitoring viewer registered");
                viewers.insert(handle.id, Viewer { handle, scope });
                record_hub_connections(HUB, viewers.len());
            }
            Command::Unregister { client_id } => {
                if let Some(viewer) = viewers.remove(&client_id) {
                    viewer.handle.close();
                    tracing::debug!(client_id = %client_id, "Monitoring viewer unregistered");
                    record_hub_connections(HUB, viewers.len());
                }
            }
            Command::Broadcast { room_id, frame } => {
                let mut evicted = Vec::new();
                for (id, viewer) in &viewers {
                    if !viewer.scope.allows_optional(room_id) {
                        continue;
                    }
                    match viewer.handle.deliver(&frame) {
                        Ok(()) => record_hub_message_sent(HUB),
                        Err(reason) => evicted.push((*id, reason)),
                    }
                }
                for (id, reason) in evicted {
                    if let Some(viewer) = viewers.remove(&id) {
                        viewer.handle.close();
                        tracing::warn!(client_id = %id, reason = reason.as_str(), "Evicting monitoring viewer");
                        record_hub_eviction(HUB, reason.as_str());
                    }
                }
                record_hub_connections(HUB, viewers.len());
            }
            Command::ConnectionCount { reply } => {
                let _ = reply.send(viewers.len());
            }
        }
    }

    for (_, viewer) in viewers.drain() {
        viewer.handle.close();
    }
}
