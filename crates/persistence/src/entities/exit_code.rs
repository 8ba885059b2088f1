//! Exit code entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::exit_code::ExitCodeItem;
use domain::models::ExitCodeStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the exit_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct ExitCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub student_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub reusable: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ExitCodeEntity> for domain::models::ExitCode {
    fn from(entity: ExitCodeEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            created_by: entity.created_by,
            student_id: entity.student_id,
            room_id: entity.room_id,
            reusable: entity.reusable,
            used_at: entity.used_at,
            created_at: entity.created_at,
        }
    }
}

/// Exit code joined with student and room names for listing.
#[derive(Debug, Clone, FromRow)]
pub struct ExitCodeWithDetailsEntity {
    pub id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub student_id: Option<Uuid>,
    pub student_name: Option<String>,
    pub room_id: Option<Uuid>,
    pub room_name: Option<String>,
    pub reusable: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ExitCodeWithDetailsEntity> for ExitCodeItem {
    fn from(entity: ExitCodeWithDetailsEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            created_by: entity.created_by,
            student_user_id: entity.student_id,
            student_name: entity.student_name,
            room_id: entity.room_id,
            room_name: entity.room_name,
            reusable: entity.reusable,
            used_at: entity.used_at,
            created_at: entity.created_at,
            status: ExitCodeStatus::from_used_at(entity.used_at),
        }
    }
}
