//! Student status repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{MonitoringStudentEntity, StudentStatusEntity};
use crate::metrics::QueryTimer;

const STATUS_COLUMNS: &str =
    "id, user_id, app_version, locked, blocked_from_exam, force_logout_at, created_at, updated_at";

/// Filters for the monitoring student list.
#[derive(Debug, Clone, Default)]
pub struct MonitoringListFilter {
    /// Restrict to students in these rooms; `None` means unrestricted.
    pub scope_room_ids: Option<Vec<Uuid>>,
    pub room_id: Option<Uuid>,
    /// Case-insensitive substring of full name or email.
    pub search: Option<String>,
    /// Whitelisted sort key.
    pub sort_by: &'static str,
    pub sort_desc: bool,
    /// `None` returns every row.
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Repository for student status rows.
#[derive(Clone)]
pub struct StudentStatusRepository {
    pool: PgPool,
}

impl StudentStatusRepository {
    /// Creates a new StudentStatusRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the status of a student.
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<StudentStatusEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_student_status");
        let sql = format!(
            "SELECT {} FROM student_statuses WHERE user_id = $1",
            STATUS_COLUMNS
        );
        let result = sqlx::query_as::<_, StudentStatusEntity>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Creates the status row if missing and locks it for update.
    pub async fn lock_or_create(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<StudentStatusEntity, sqlx::Error> {
        let timer = QueryTimer::new("lock_or_create_student_status");
        sqlx::query(
            r#"
            INSERT INTO student_statuses (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        let sql = format!(
            "SELECT {} FROM student_statuses WHERE user_id = $1 FOR UPDATE",
            STATUS_COLUMNS
        );
        let result = sqlx::query_as::<_, StudentStatusEntity>(&sql)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await;
        timer.record();
        result
    }

    /// Writes a full flag update to a locked row.
    pub async fn save(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        app_version: &str,
        locked: bool,
        blocked_from_exam: bool,
    ) -> Result<StudentStatusEntity, sqlx::Error> {
        let timer = QueryTimer::new("save_student_status");
        let sql = format!(
            r#"
            UPDATE student_statuses
            SET app_version = $2, locked = $3, blocked_from_exam = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            STATUS_COLUMNS
        );
        let result = sqlx::query_as::<_, StudentStatusEntity>(&sql)
            .bind(id)
            .bind(app_version)
            .bind(locked)
            .bind(blocked_from_exam)
            .fetch_one(&mut *conn)
            .await;
        timer.record();
        result
    }

    /// Blocks the student, releases the lock and stamps the logout time.
    pub async fn force_logout(&self, user_id: Uuid) -> Result<StudentStatusEntity, sqlx::Error> {
        let timer = QueryTimer::new("force_logout_student");
        let sql = format!(
            r#"
            INSERT INTO student_statuses (user_id, locked, blocked_from_exam, force_logout_at)
            VALUES ($1, FALSE, TRUE, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET locked = FALSE,
                blocked_from_exam = TRUE,
                force_logout_at = NOW(),
                updated_at = NOW()
            RETURNING {}
            "#,
            STATUS_COLUMNS
        );
        let result = sqlx::query_as::<_, StudentStatusEntity>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Lifts the exam block. The lock flag is left unchanged.
    pub async fn allow_exam(&self, user_id: Uuid) -> Result<StudentStatusEntity, sqlx::Error> {
        let timer = QueryTimer::new("allow_exam_student");
        let sql = format!(
            r#"
            INSERT INTO student_statuses (user_id, blocked_from_exam)
            VALUES ($1, FALSE)
            ON CONFLICT (user_id) DO UPDATE
            SET blocked_from_exam = FALSE,
                updated_at = NOW()
            RETURNING {}
            "#,
            STATUS_COLUMNS
        );
        let result = sqlx::query_as::<_, StudentStatusEntity>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Clears the lock after the student consumed an exit code.
    pub async fn release_lock(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("release_student_lock");
        let result = sqlx::query(
            r#"
            INSERT INTO student_statuses (user_id, locked)
            VALUES ($1, FALSE)
            ON CONFLICT (user_id) DO UPDATE
            SET locked = FALSE,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Students joined with status and room, plus the total match count.
    pub async fn list_monitoring(
        &self,
        filter: &MonitoringListFilter,
    ) -> Result<(Vec<MonitoringStudentEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_monitoring_students");

        const FROM_WHERE: &str = r#"
            FROM users u
            LEFT JOIN student_statuses ss ON ss.user_id = u.id
            LEFT JOIN room_students rs ON rs.user_id = u.id
            LEFT JOIN rooms r ON r.id = rs.room_id
            WHERE u.role = 'siswa'
              AND ($1::uuid[] IS NULL OR rs.room_id = ANY($1))
              AND ($2::uuid IS NULL OR rs.room_id = $2)
              AND ($3::text IS NULL OR u.full_name ILIKE $3 OR u.email ILIKE $3)
        "#;

        let pattern = filter
            .search
            .as_deref()
            .map(|q| format!("%{}%", escape_like(q)));

        let count_sql = format!("SELECT COUNT(DISTINCT u.id) {}", FROM_WHERE);
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.scope_room_ids.as_deref())
            .bind(filter.room_id)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            r#"
            SELECT u.id AS user_id, u.full_name, u.email, u.class_name, u.major,
                   ss.id AS status_id,
                   COALESCE(ss.app_version, '') AS app_version,
                   COALESCE(ss.locked, FALSE) AS locked,
                   COALESCE(ss.blocked_from_exam, FALSE) AS blocked_from_exam,
                   ss.force_logout_at,
                   COALESCE(ss.updated_at, u.updated_at) AS monitoring_updated_at,
                   r.id AS room_id,
                   r.name AS room_name
            {}
            ORDER BY {} {}, u.id
            LIMIT $4 OFFSET $5
            "#,
            FROM_WHERE,
            sort_column(filter.sort_by),
            if filter.sort_desc { "DESC" } else { "ASC" },
        );

        let rows = sqlx::query_as::<_, MonitoringStudentEntity>(&list_sql)
            .bind(filter.scope_room_ids.as_deref())
            .bind(filter.room_id)
            .bind(pattern.as_deref())
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        timer.record();
        Ok((rows, total))
    }
}

/// Maps a public sort key to its column expression.
fn sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "full_name" => "u.full_name",
        "email" => "u.email",
        "kelas" => "u.class_name",
        "jurusan" => "u.major",
        "locked" => "COALESCE(ss.locked, FALSE)",
        _ => "COALESCE(ss.updated_at, u.updated_at)",
    }
}

/// Escapes LIKE wildcards in user input.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
