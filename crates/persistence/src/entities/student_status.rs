//! Student status entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::monitoring::{MonitoringBlock, MonitoringStudentItem};
use domain::models::{RoomBlock, RoomRef};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the student_statuses table.
#[derive(Debug, Clone, FromRow)]
pub struct StudentStatusEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub app_version: String,
    pub locked: bool,
    pub blocked_from_exam: bool,
    pub force_logout_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentStatusEntity> for domain::models::StudentStatus {
    fn from(entity: StudentStatusEntity) -> Self {
        Self {
            id: entity.id,
            student_id: entity.user_id,
            app_version: entity.app_version,
            locked: entity.locked,
            blocked_from_exam: entity.blocked_from_exam,
            force_logout_at: entity.force_logout_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// A student joined with status and room for the monitoring dashboard.
#[derive(Debug, Clone, FromRow)]
pub struct MonitoringStudentEntity {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub class_name: String,
    pub major: String,
    pub status_id: Option<Uuid>,
    pub app_version: String,
    pub locked: bool,
    pub blocked_from_exam: bool,
    pub force_logout_at: Option<DateTime<Utc>>,
    pub monitoring_updated_at: DateTime<Utc>,
    pub room_id: Option<Uuid>,
    pub room_name: Option<String>,
}

impl From<MonitoringStudentEntity> for MonitoringStudentItem {
    fn from(entity: MonitoringStudentEntity) -> Self {
        let room = match (entity.room_id, entity.room_name) {
            (Some(id), Some(name)) => Some(RoomRef { id, name }),
            _ => None,
        };
        Self {
            id: entity.user_id,
            full_name: entity.full_name,
            email: entity.email,
            class_name: entity.class_name,
            major: entity.major,
            monitoring: MonitoringBlock {
                id: entity.status_id,
                app_version: entity.app_version,
                locked: entity.locked,
                blocked_from_exam: entity.blocked_from_exam,
                force_logout_at: entity.force_logout_at,
                updated_at: Some(entity.monitoring_updated_at),
            },
            room: RoomBlock(room),
        }
    }
}
