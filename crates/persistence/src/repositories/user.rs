//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{UserEntity, UserRoleDb};
use crate::metrics::QueryTimer;

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub role: UserRoleDb,
    pub class_name: &'a str,
    pub major: &'a str,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a user. Credentials are managed by the authentication service.
    pub async fn create(&self, user: NewUser<'_>) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, full_name, role, class_name, major)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, full_name, role, active, class_name, major, created_at, updated_at
            "#,
        )
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.role)
        .bind(user.class_name)
        .bind(user.major)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, full_name, role, active, class_name, major, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find every user among `ids`. Missing ids are simply absent.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_users_by_ids");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, full_name, role, active, class_name, major, created_at, updated_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Enables or disables an account.
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_user_active");
        let result = sqlx::query(
            r#"
            UPDATE users SET active = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(active)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }
}
