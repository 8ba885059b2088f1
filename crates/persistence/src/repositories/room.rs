//! Room repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{RoomEntity, RoomMembershipEntity};
use crate::metrics::QueryTimer;

/// Repository for rooms and their student/supervisor membership.
#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    /// Creates a new RoomRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a room.
    pub async fn create(&self, name: &str) -> Result<RoomEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_room");
        let result = sqlx::query_as::<_, RoomEntity>(
            r#"
            INSERT INTO rooms (name)
            VALUES ($1)
            RETURNING id, name, active, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a room by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RoomEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_room_by_id");
        let result = sqlx::query_as::<_, RoomEntity>(
            r#"
            SELECT id, name, active, created_at, updated_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Assign a student to a room. Fails with a unique violation if the
    /// student already belongs to a room.
    pub async fn add_student(&self, room_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("add_room_student");
        let result = sqlx::query(
            r#"
            INSERT INTO room_students (room_id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Assign a supervisor to a room. Idempotent.
    pub async fn add_supervisor(&self, room_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("add_room_supervisor");
        let result = sqlx::query(
            r#"
            INSERT INTO room_supervisors (room_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (room_id, user_id) DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Rooms supervised by a user.
    pub async fn supervised_room_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("supervised_room_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT room_id FROM room_supervisors
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The room a student belongs to, with its name.
    pub async fn membership_for_student(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RoomMembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("room_membership_for_student");
        let result = sqlx::query_as::<_, RoomMembershipEntity>(
            r#"
            SELECT rs.room_id, r.name AS room_name
            FROM room_students rs
            JOIN rooms r ON r.id = rs.room_id
            WHERE rs.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All students currently assigned to a room, oldest assignment first.
    pub async fn student_ids(&self, room_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("room_student_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id FROM room_students
            WHERE room_id = $1
            ORDER BY created_at, user_id
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The subset of `user_ids` assigned to a room.
    pub async fn members_among(
        &self,
        room_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("room_members_among");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id FROM room_students
            WHERE room_id = $1 AND user_id = ANY($2)
            "#,
        )
        .bind(room_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether a student is assigned to a room.
    pub async fn is_student_in_room(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_student_in_room");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM room_students
                WHERE room_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
