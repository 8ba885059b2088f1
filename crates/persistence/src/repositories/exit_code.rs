//! Exit code repository for database operations.
//!
//! Methods taking a `&mut PgConnection` are meant to run inside a caller's
//! transaction so generation and consumption stay atomic.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{ExitCodeEntity, ExitCodeWithDetailsEntity};
use crate::metrics::QueryTimer;

/// Filters for listing exit codes.
#[derive(Debug, Clone, Default)]
pub struct ExitCodeListFilter {
    /// Restrict to these rooms; `None` means unrestricted.
    pub scope_room_ids: Option<Vec<Uuid>>,
    pub room_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    /// `Some(true)` for used codes, `Some(false)` for unused, `None` for both.
    pub used: Option<bool>,
    /// Whitelisted sort key.
    pub sort_by: &'static str,
    pub sort_desc: bool,
    /// `None` returns every row.
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Repository for exit code database operations.
#[derive(Clone)]
pub struct ExitCodeRepository {
    pool: PgPool,
}

impl ExitCodeRepository {
    /// Creates a new ExitCodeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a code unless the code string is already taken.
    ///
    /// Returns `None` on a code collision so the caller can retry with a new
    /// code without aborting its transaction.
    pub async fn try_insert(
        &self,
        conn: &mut PgConnection,
        code: &str,
        created_by: Uuid,
        student_id: Option<Uuid>,
        room_id: Option<Uuid>,
        reusable: bool,
    ) -> Result<Option<ExitCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("insert_exit_code");
        let result = sqlx::query_as::<_, ExitCodeEntity>(
            r#"
            INSERT INTO exit_codes (code, created_by, student_id, room_id, reusable)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            RETURNING id, code, created_by, student_id, room_id, reusable, used_at, created_at
            "#,
        )
        .bind(code)
        .bind(created_by)
        .bind(student_id)
        .bind(room_id)
        .bind(reusable)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Row-locks the target students for the rest of the transaction.
    ///
    /// Concurrent generations for the same student queue here, so each
    /// supersede sees the codes committed by the one before it. Ids are
    /// locked in sorted order.
    pub async fn lock_targets(
        &self,
        conn: &mut PgConnection,
        student_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("lock_exit_code_targets");
        let result = sqlx::query(
            r#"
            SELECT id FROM users
            WHERE id = ANY($1)
            ORDER BY id
            FOR NO KEY UPDATE
            "#,
        )
        .bind(student_ids)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Marks every unused personal code of a student in a room as used.
    pub async fn supersede_unused(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        room_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("supersede_exit_codes");
        let result = sqlx::query(
            r#"
            UPDATE exit_codes
            SET used_at = NOW()
            WHERE student_id = $1 AND room_id = $2 AND used_at IS NULL
            "#,
        )
        .bind(student_id)
        .bind(room_id)
        .execute(&mut *conn)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    /// Locks the unused personal code matching `code` for `student_id`.
    ///
    /// Concurrent callers block on the row lock; once the holder marks it
    /// used, the others re-evaluate `used_at IS NULL` and find nothing.
    pub async fn lock_unused_personal(
        &self,
        conn: &mut PgConnection,
        code: &str,
        student_id: Uuid,
        room_id: Option<Uuid>,
    ) -> Result<Option<ExitCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_unused_personal_exit_code");
        let result = sqlx::query_as::<_, ExitCodeEntity>(
            r#"
            SELECT id, code, created_by, student_id, room_id, reusable, used_at, created_at
            FROM exit_codes
            WHERE code = $1
              AND student_id = $2
              AND used_at IS NULL
              AND ($3::uuid IS NULL OR room_id = $3)
            FOR UPDATE
            "#,
        )
        .bind(code)
        .bind(student_id)
        .bind(room_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Finds an unused reusable code matching `code`.
    pub async fn find_unused_reusable(
        &self,
        conn: &mut PgConnection,
        code: &str,
        room_id: Option<Uuid>,
    ) -> Result<Option<ExitCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_unused_reusable_exit_code");
        let result = sqlx::query_as::<_, ExitCodeEntity>(
            r#"
            SELECT id, code, created_by, student_id, room_id, reusable, used_at, created_at
            FROM exit_codes
            WHERE code = $1
              AND reusable = TRUE
              AND used_at IS NULL
              AND ($2::uuid IS NULL OR room_id = $2)
            "#,
        )
        .bind(code)
        .bind(room_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Sets `used_at` on a code that is still unused.
    pub async fn mark_used(&self, conn: &mut PgConnection, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_exit_code_used");
        let result = sqlx::query(
            r#"
            UPDATE exit_codes SET used_at = NOW()
            WHERE id = $1 AND used_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    /// Find a code by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ExitCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_exit_code_by_id");
        let result = sqlx::query_as::<_, ExitCodeEntity>(
            r#"
            SELECT id, code, created_by, student_id, room_id, reusable, used_at, created_at
            FROM exit_codes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Revokes a code. A second revocation affects no rows.
    pub async fn revoke(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("revoke_exit_code");
        let result = sqlx::query(
            r#"
            UPDATE exit_codes SET used_at = NOW()
            WHERE id = $1 AND used_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    /// List codes with student and room names, plus the total match count.
    pub async fn list(
        &self,
        filter: &ExitCodeListFilter,
    ) -> Result<(Vec<ExitCodeWithDetailsEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_exit_codes");

        const WHERE_CLAUSE: &str = r#"
            WHERE ($1::uuid[] IS NULL OR ec.room_id = ANY($1))
              AND ($2::uuid IS NULL OR ec.room_id = $2)
              AND ($3::uuid IS NULL OR ec.student_id = $3)
              AND ($4::boolean IS NULL OR (ec.used_at IS NOT NULL) = $4)
        "#;

        let count_sql = format!("SELECT COUNT(*) FROM exit_codes ec {}", WHERE_CLAUSE);
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.scope_room_ids.as_deref())
            .bind(filter.room_id)
            .bind(filter.student_id)
            .bind(filter.used)
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            r#"
            SELECT ec.id, ec.code, ec.created_by, ec.student_id, su.full_name AS student_name,
                   ec.room_id, r.name AS room_name, ec.reusable, ec.used_at, ec.created_at
            FROM exit_codes ec
            LEFT JOIN users su ON su.id = ec.student_id
            LEFT JOIN rooms r ON r.id = ec.room_id
            {}
            ORDER BY {} {} NULLS LAST, ec.id
            LIMIT $5 OFFSET $6
            "#,
            WHERE_CLAUSE,
            sort_column(filter.sort_by),
            if filter.sort_desc { "DESC" } else { "ASC" },
        );

        let rows = sqlx::query_as::<_, ExitCodeWithDetailsEntity>(&list_sql)
            .bind(filter.scope_room_ids.as_deref())
            .bind(filter.room_id)
            .bind(filter.student_id)
            .bind(filter.used)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        timer.record();
        Ok((rows, total))
    }
}

/// Maps a public sort key to its column.
fn sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "id" => "ec.id",
        "used_at" => "ec.used_at",
        "code" => "ec.code",
        "student_user_id" => "ec.student_id",
        _ => "ec.created_at",
    }
}
