//! Room entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::RoomRef;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the rooms table.
#[derive(Debug, Clone, FromRow)]
pub struct RoomEntity {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomEntity> for domain::models::Room {
    fn from(entity: RoomEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            active: entity.active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// A student's room membership joined with the room name.
#[derive(Debug, Clone, FromRow)]
pub struct RoomMembershipEntity {
    pub room_id: Uuid,
    pub room_name: String,
}

impl From<RoomMembershipEntity> for RoomRef {
    fn from(entity: RoomMembershipEntity) -> Self {
        Self {
            id: entity.room_id,
            name: entity.room_name,
        }
    }
}
