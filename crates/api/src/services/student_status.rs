//! Student status service: self reports, supervisor actions and the
//! monitoring list.

use domain::models::exit_code::{parse_all_flag, MessageResponse};
use domain::models::monitoring::{
    ListMonitoringStudentsQuery, ListMonitoringStudentsResponse, MONITORING_SORT_COLUMNS,
};
use domain::models::student_status::UpdateStudentStatusRequest;
use domain::models::{StudentStatus, StudentStatusSnapshot, User, UserRole};
use domain::services::{apply_self_update, StatusChange, StatusFlags};
use persistence::repositories::{
    MonitoringListFilter, RoomRepository, StudentStatusRepository, UserRepository,
};
use shared::pagination::{whitelist_sort, PageMeta, PageWindow, SortDirection};
use shared::validation::non_blank;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::access::{authorized_rooms_for, require_staff};
use crate::services::broadcast::StatusBroadcaster;

pub struct StudentStatusService {
    pool: PgPool,
    broadcaster: StatusBroadcaster,
}

impl StudentStatusService {
    pub fn new(pool: PgPool, broadcaster: StatusBroadcaster) -> Self {
        Self { pool, broadcaster }
    }

    /// Current status of the caller; zeroed when nothing was reported yet.
    pub async fn get_self(&self, user: &CurrentUser) -> Result<StudentStatusSnapshot, ApiError> {
        let status = StudentStatusRepository::new(self.pool.clone())
            .find_by_user(user.user_id)
            .await?
            .map(StudentStatus::from);

        Ok(status
            .as_ref()
            .map(StudentStatusSnapshot::from)
            .unwrap_or_default())
    }

    /// Applies a self-reported status change under a row lock.
    pub async fn update_self(
        &self,
        user: &CurrentUser,
        request: &UpdateStudentStatusRequest,
    ) -> Result<StudentStatusSnapshot, ApiError> {
        request.validate()?;

        let repo = StudentStatusRepository::new(self.pool.clone());
        let mut tx = self.pool.begin().await?;

        let current = repo.lock_or_create(&mut tx, user.user_id).await?;
        let next = apply_self_update(
            StatusFlags {
                locked: current.locked,
                blocked_from_exam: current.blocked_from_exam,
            },
            StatusChange {
                locked: request.locked,
                blocked_from_exam: request.blocked_from_exam,
            },
            user.role,
        )?;

        let app_version = non_blank(request.app_version.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| current.app_version.clone());

        let saved = repo
            .save(
                &mut tx,
                current.id,
                &app_version,
                next.locked,
                next.blocked_from_exam,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            student_id = %user.user_id,
            locked = saved.locked,
            blocked_from_exam = saved.blocked_from_exam,
            "Student status updated"
        );
        // Staff self reports are stored but not shown on dashboards
        if user.role == UserRole::Student {
            self.broadcaster.dispatch(user.user_id);
        }

        let status = StudentStatus::from(saved);
        Ok(StudentStatusSnapshot::from(&status))
    }

    /// Blocks a student from the exam and releases their lock.
    pub async fn force_logout(
        &self,
        actor: &CurrentUser,
        student_id: Uuid,
    ) -> Result<MessageResponse, ApiError> {
        self.authorize_student_action(actor, student_id).await?;

        let saved = StudentStatusRepository::new(self.pool.clone())
            .force_logout(student_id)
            .await?;

        tracing::info!(
            actor_id = %actor.user_id,
            student_id = %student_id,
            force_logout_at = ?saved.force_logout_at,
            "Student forced out of exam"
        );
        self.broadcaster.dispatch(student_id);

        Ok(MessageResponse::new("student logged out and blocked"))
    }

    /// Lifts the exam block. The lock flag is not changed.
    pub async fn allow_exam(
        &self,
        actor: &CurrentUser,
        student_id: Uuid,
    ) -> Result<MessageResponse, ApiError> {
        self.authorize_student_action(actor, student_id).await?;

        StudentStatusRepository::new(self.pool.clone())
            .allow_exam(student_id)
            .await?;

        tracing::info!(
            actor_id = %actor.user_id,
            student_id = %student_id,
            "Student allowed to start exam"
        );
        self.broadcaster.dispatch(student_id);

        Ok(MessageResponse::new("student allowed to start exam"))
    }

    /// Students with their live status, scoped to the caller's rooms.
    pub async fn list_students(
        &self,
        actor: &CurrentUser,
        query: &ListMonitoringStudentsQuery,
    ) -> Result<ListMonitoringStudentsResponse, ApiError> {
        require_staff(actor.role)?;

        let window = PageWindow::resolve(
            query.page,
            query.limit,
            parse_all_flag(query.all.as_deref()),
        );
        let sort_by = whitelist_sort(
            query.sort_by.as_deref(),
            MONITORING_SORT_COLUMNS,
            "updated_at",
        );
        let sort_dir = SortDirection::parse_or_default(query.sort_dir.as_deref());

        let scope = authorized_rooms_for(&self.pool, actor.user_id, actor.role).await?;
        if scope.is_empty() {
            return Ok(ListMonitoringStudentsResponse {
                data: Vec::new(),
                meta: PageMeta::new(0, window, sort_by, sort_dir),
            });
        }

        let (limit, offset) = match window.limit_offset() {
            Some((limit, offset)) => (Some(limit), offset),
            None => (None, 0),
        };
        let filter = MonitoringListFilter {
            scope_room_ids: scope.room_ids(),
            room_id: query.room_id,
            search: non_blank(query.q.as_deref()).map(str::to_string),
            sort_by,
            sort_desc: sort_dir == SortDirection::Desc,
            limit,
            offset,
        };

        let (rows, total) = StudentStatusRepository::new(self.pool.clone())
            .list_monitoring(&filter)
            .await?;

        Ok(ListMonitoringStudentsResponse {
            data: rows.into_iter().map(Into::into).collect(),
            meta: PageMeta::new(total, window, sort_by, sort_dir),
        })
    }

    /// Staff may act on existing students inside their room scope.
    async fn authorize_student_action(
        &self,
        actor: &CurrentUser,
        student_id: Uuid,
    ) -> Result<(), ApiError> {
        require_staff(actor.role)?;

        let target: User = UserRepository::new(self.pool.clone())
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?
            .into();

        if target.role != UserRole::Student {
            return Err(ApiError::Validation("target is not a student".to_string()));
        }

        if actor.role == UserRole::Supervisor {
            let scope = authorized_rooms_for(&self.pool, actor.user_id, actor.role).await?;
            let room_id = RoomRepository::new(self.pool.clone())
                .membership_for_student(student_id)
                .await?
                .map(|m| m.room_id);
            if !scope.allows_optional(room_id) {
                return Err(ApiError::Forbidden(
                    "not allowed for this student".to_string(),
                ));
            }
        }

        Ok(())
    }
}
