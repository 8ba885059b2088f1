//! Fans a student's status out to the live connection hubs.

use std::sync::Arc;

use domain::models::{RoomRef, StudentStatus};
use domain::services::{build_status_broadcast, StatusBroadcast};
use persistence::repositories::{RoomRepository, StudentStatusRepository};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::realtime::{Frame, HubClosed, MonitoringHub, StudentHub};

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Hub(#[from] HubClosed),
}

/// Pushes status snapshots to dashboards and to the student.
#[derive(Clone)]
pub struct StatusBroadcaster {
    pool: PgPool,
    monitoring: MonitoringHub,
    students: StudentHub,
}

impl StatusBroadcaster {
    pub fn new(pool: PgPool, monitoring: MonitoringHub, students: StudentHub) -> Self {
        Self {
            pool,
            monitoring,
            students,
        }
    }

    /// Publishes the student's current status in a detached task.
    ///
    /// Returns immediately; failures are logged and dropped.
    pub fn dispatch(&self, student_id: Uuid) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.publish(student_id).await {
                tracing::warn!(student_id = %student_id, error = %e, "Status broadcast failed");
            }
        });
    }

    /// Loads the status and room of a student and pushes both payloads.
    ///
    /// Returns `false` when the student has no status row yet.
    pub async fn publish(&self, student_id: Uuid) -> Result<bool, BroadcastError> {
        let status: StudentStatus = match StudentStatusRepository::new(self.pool.clone())
            .find_by_user(student_id)
            .await?
        {
            Some(entity) => entity.into(),
            None => return Ok(false),
        };

        let room: Option<RoomRef> = RoomRepository::new(self.pool.clone())
            .membership_for_student(student_id)
            .await?
            .map(Into::into);

        let broadcast = build_status_broadcast(&status, room);
        self.send(student_id, &broadcast).await?;

        tracing::debug!(
            student_id = %student_id,
            room_id = ?broadcast.room_id(),
            locked = status.locked,
            blocked_from_exam = status.blocked_from_exam,
            "Status broadcast sent"
        );
        Ok(true)
    }

    async fn send(&self, student_id: Uuid, broadcast: &StatusBroadcast) -> Result<(), BroadcastError> {
        let snapshot: Frame = Arc::from(serde_json::to_string(&broadcast.snapshot)?);
        let message: Frame = Arc::from(serde_json::to_string(&broadcast.student_message)?);

        self.monitoring
            .broadcast(broadcast.room_id(), snapshot)
            .await?;
        self.students.notify(student_id, message).await?;
        Ok(())
    }
}
