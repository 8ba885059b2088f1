//! Exit code engine: generation, consumption, revocation and listing.

use domain::models::exit_code::{
    parse_all_flag, ConsumeExitCodeRequest, ConsumeExitCodeResponse, GenerateExitCodesRequest,
    GenerateExitCodesResponse, GeneratedExitCode, GenerationMode, ListExitCodesQuery,
    ListExitCodesResponse, MessageResponse, UsedFilter, EXIT_CODE_SORT_COLUMNS,
};
use domain::models::{ExitCode, UserRole};
use persistence::entities::ExitCodeEntity;
use persistence::repositories::{
    ExitCodeListFilter, ExitCodeRepository, RoomRepository, StudentStatusRepository,
    UserRepository,
};
use shared::crypto::{effective_code_length, generate_exit_code};
use shared::pagination::{whitelist_sort, PageMeta, PageWindow, SortDirection};
use shared::validation::non_blank;
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::access::{authorized_rooms_for, require_staff};
use crate::services::broadcast::StatusBroadcaster;

/// Attempts per code before giving up on a collision streak.
const MAX_INSERT_ATTEMPTS: usize = 5;

const NOT_ALLOWED_FOR_ROOM: &str = "not allowed for this room";
const NOT_FOUND_OR_USED: &str = "code not found or already used";

pub struct ExitCodeService {
    pool: PgPool,
    broadcaster: StatusBroadcaster,
}

impl ExitCodeService {
    pub fn new(pool: PgPool, broadcaster: StatusBroadcaster) -> Self {
        Self { pool, broadcaster }
    }

    /// Issues codes for a room.
    ///
    /// Every check runs before the transaction opens; supersession and
    /// inserts commit or roll back together.
    pub async fn generate(
        &self,
        actor: &CurrentUser,
        request: &GenerateExitCodesRequest,
    ) -> Result<GenerateExitCodesResponse, ApiError> {
        let (room_raw, mode) = request.mode()?;
        request.validate()?;
        let length = effective_code_length(request.length);

        let room_id = Uuid::parse_str(room_raw)
            .map_err(|_| ApiError::Validation("room_id must be a valid UUID".to_string()))?;

        let scope = authorized_rooms_for(&self.pool, actor.user_id, actor.role).await?;
        if !scope.allows(room_id) {
            return Err(ApiError::Forbidden(NOT_ALLOWED_FOR_ROOM.to_string()));
        }

        let rooms = RoomRepository::new(self.pool.clone());
        if rooms.find_by_id(room_id).await?.is_none() {
            return Err(ApiError::NotFound("room not found".to_string()));
        }

        let targets = match &mode {
            GenerationMode::SingleForRoom => Vec::new(),
            GenerationMode::AllStudents => rooms.student_ids(room_id).await?,
            GenerationMode::Students(raw) => {
                let ids = parse_student_ids(raw)?;
                let members: HashSet<Uuid> =
                    rooms.members_among(room_id, &ids).await?.into_iter().collect();
                if ids.iter().any(|id| !members.contains(id)) {
                    return Err(ApiError::Validation(
                        "student is not assigned to the specified room".to_string(),
                    ));
                }
                ids
            }
        };

        if mode != GenerationMode::SingleForRoom {
            self.ensure_students(&targets).await?;
        }

        let repo = ExitCodeRepository::new(self.pool.clone());
        let mut tx = self.pool.begin().await?;
        let mut issued = Vec::with_capacity(targets.len().max(1));

        if mode == GenerationMode::SingleForRoom {
            let entity =
                insert_fresh_code(&repo, &mut tx, length, actor.user_id, None, room_id).await?;
            issued.push(entity);
        } else {
            repo.lock_targets(&mut tx, &targets).await?;
            for student_id in &targets {
                repo.supersede_unused(&mut tx, *student_id, room_id).await?;
                let entity = insert_fresh_code(
                    &repo,
                    &mut tx,
                    length,
                    actor.user_id,
                    Some(*student_id),
                    room_id,
                )
                .await?;
                issued.push(entity);
            }
        }

        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.user_id,
            room_id = %room_id,
            count = issued.len(),
            reusable = mode == GenerationMode::SingleForRoom,
            "Exit codes generated"
        );

        Ok(GenerateExitCodesResponse {
            data: issued
                .into_iter()
                .map(|e| GeneratedExitCode::from(ExitCode::from(e)))
                .collect(),
        })
    }

    /// Consumes a code on behalf of a student.
    ///
    /// A personal code is locked and marked used; a reusable room code is
    /// only checked against room membership and stays unused. A student
    /// consuming for themself is unlocked in the same transaction.
    pub async fn consume(
        &self,
        actor: &CurrentUser,
        request: &ConsumeExitCodeRequest,
    ) -> Result<ConsumeExitCodeResponse, ApiError> {
        let target = resolve_consume_target(actor, request.student_user_id.as_deref())?;
        request.validate()?;
        let code = request.code.trim();
        let room_id = match non_blank(request.room_id.as_deref()) {
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                ApiError::Validation("room_id must be a valid UUID".to_string())
            })?),
            None => None,
        };

        let scope = authorized_rooms_for(&self.pool, actor.user_id, actor.role).await?;
        let repo = ExitCodeRepository::new(self.pool.clone());
        let rooms = RoomRepository::new(self.pool.clone());
        let mut tx = self.pool.begin().await?;

        let reusable = match repo
            .lock_unused_personal(&mut tx, code, target, room_id)
            .await?
        {
            Some(personal) => {
                if actor.role == UserRole::Supervisor && !scope.allows_optional(personal.room_id) {
                    return Err(ApiError::Forbidden(NOT_ALLOWED_FOR_ROOM.to_string()));
                }
                repo.mark_used(&mut tx, personal.id).await?;
                false
            }
            None => {
                let room_code = repo
                    .find_unused_reusable(&mut tx, code, room_id)
                    .await?
                    .ok_or_else(|| ApiError::Conflict(NOT_FOUND_OR_USED.to_string()))?;
                let code_room = room_code
                    .room_id
                    .ok_or_else(|| ApiError::Conflict(NOT_FOUND_OR_USED.to_string()))?;
                if !rooms.is_student_in_room(code_room, target).await? {
                    return Err(ApiError::Forbidden(NOT_ALLOWED_FOR_ROOM.to_string()));
                }
                if actor.role == UserRole::Supervisor && !scope.allows(code_room) {
                    return Err(ApiError::Forbidden(NOT_ALLOWED_FOR_ROOM.to_string()));
                }
                true
            }
        };

        if actor.role == UserRole::Student {
            StudentStatusRepository::new(self.pool.clone())
                .release_lock(&mut tx, target)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            actor_id = %actor.user_id,
            student_id = %target,
            reusable,
            "Exit code consumed"
        );
        self.broadcaster.dispatch(target);

        Ok(ConsumeExitCodeResponse {
            message: "consumed".to_string(),
            reusable,
        })
    }

    /// Marks a code used without a consumer. Revoking twice is a no-op.
    pub async fn revoke(
        &self,
        actor: &CurrentUser,
        code_id: Uuid,
    ) -> Result<MessageResponse, ApiError> {
        require_staff(actor.role)?;

        let repo = ExitCodeRepository::new(self.pool.clone());
        let code = repo
            .find_by_id(code_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("exit code not found".to_string()))?;

        if actor.role == UserRole::Supervisor {
            let room_id = code.room_id.ok_or_else(|| {
                ApiError::Forbidden("not allowed to revoke this code".to_string())
            })?;
            let scope = authorized_rooms_for(&self.pool, actor.user_id, actor.role).await?;
            if !scope.allows(room_id) {
                return Err(ApiError::Forbidden(NOT_ALLOWED_FOR_ROOM.to_string()));
            }
        }

        let affected = repo.revoke(code_id).await?;
        tracing::info!(
            actor_id = %actor.user_id,
            code_id = %code_id,
            changed = affected > 0,
            "Exit code revoked"
        );

        Ok(MessageResponse::new("revoked"))
    }

    /// Lists codes visible to the caller.
    pub async fn list(
        &self,
        actor: &CurrentUser,
        query: &ListExitCodesQuery,
    ) -> Result<ListExitCodesResponse, ApiError> {
        let window = PageWindow::resolve(
            query.page,
            query.limit,
            parse_all_flag(query.all.as_deref()),
        );
        let sort_by = whitelist_sort(
            query.sort_by.as_deref(),
            EXIT_CODE_SORT_COLUMNS,
            "created_at",
        );
        let sort_dir = SortDirection::parse_or_default(query.sort_dir.as_deref());

        let scope = authorized_rooms_for(&self.pool, actor.user_id, actor.role).await?;
        if scope.is_empty() {
            return Ok(ListExitCodesResponse {
                data: Vec::new(),
                meta: PageMeta::new(0, window, sort_by, sort_dir),
            });
        }

        let (limit, offset) = match window.limit_offset() {
            Some((limit, offset)) => (Some(limit), offset),
            None => (None, 0),
        };
        let filter = ExitCodeListFilter {
            scope_room_ids: scope.room_ids(),
            room_id: query.room_id,
            student_id: query.student_user_id,
            used: match UsedFilter::parse(query.used.as_deref()) {
                UsedFilter::Unused => Some(false),
                UsedFilter::Used => Some(true),
                UsedFilter::All => None,
            },
            sort_by,
            sort_desc: sort_dir == SortDirection::Desc,
            limit,
            offset,
        };

        let (rows, total) = ExitCodeRepository::new(self.pool.clone())
            .list(&filter)
            .await?;

        Ok(ListExitCodesResponse {
            data: rows.into_iter().map(Into::into).collect(),
            meta: PageMeta::new(total, window, sort_by, sort_dir),
        })
    }

    /// Every target must be an existing student account.
    async fn ensure_students(&self, targets: &[Uuid]) -> Result<(), ApiError> {
        if targets.is_empty() {
            return Err(ApiError::Validation(
                "no students found for code generation".to_string(),
            ));
        }

        let users = UserRepository::new(self.pool.clone())
            .find_by_ids(targets)
            .await?;
        let students: HashSet<Uuid> = users
            .into_iter()
            .map(domain::models::User::from)
            .filter(|u| u.role == UserRole::Student)
            .map(|u| u.id)
            .collect();

        if targets.iter().all(|id| students.contains(id)) {
            Ok(())
        } else {
            Err(ApiError::Validation(
                "all targets must be existing students".to_string(),
            ))
        }
    }
}

/// Inserts a freshly drawn code, redrawing on collision.
async fn insert_fresh_code(
    repo: &ExitCodeRepository,
    conn: &mut PgConnection,
    length: usize,
    created_by: Uuid,
    student_id: Option<Uuid>,
    room_id: Uuid,
) -> Result<ExitCodeEntity, ApiError> {
    for attempt in 1..=MAX_INSERT_ATTEMPTS {
        let code = generate_exit_code(length);
        if let Some(entity) = repo
            .try_insert(
                conn,
                &code,
                created_by,
                student_id,
                Some(room_id),
                student_id.is_none(),
            )
            .await?
        {
            return Ok(entity);
        }
        tracing::debug!(attempt, "Exit code collision, retrying");
    }
    Err(ApiError::Conflict("code already exists, retry".to_string()))
}

/// Trims, parses and deduplicates explicit target ids in first-seen order.
fn parse_student_ids(raw: &[String]) -> Result<Vec<Uuid>, ApiError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ApiError::Validation(
                "student_ids cannot contain blank values".to_string(),
            ));
        }
        let id = Uuid::parse_str(trimmed).map_err(|_| {
            ApiError::Validation(format!("invalid student id: {}", trimmed))
        })?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Picks the student a consumption is for.
///
/// Students always consume for themselves; staff must name the student.
fn resolve_consume_target(
    actor: &CurrentUser,
    requested: Option<&str>,
) -> Result<Uuid, ApiError> {
    let requested = non_blank(requested);
    match actor.role {
        UserRole::Student => match requested {
            Some(raw) if Uuid::parse_str(raw).ok() != Some(actor.user_id) => Err(
                ApiError::Forbidden("cannot consume code for another student".to_string()),
            ),
            _ => Ok(actor.user_id),
        },
        UserRole::Admin | UserRole::Supervisor => {
            let raw = requested.ok_or_else(|| {
                ApiError::Validation("student_user_id is required".to_string())
            })?;
            Uuid::parse_str(raw).map_err(|_| {
                ApiError::Validation("student_user_id must be a valid UUID".to_string())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::User;

    fn actor(role: UserRole) -> CurrentUser {
        let now = Utc::now();
        let id = Uuid::new_v4();
        CurrentUser {
            user_id: id,
            role,
            user: User {
                id,
                email: "someone@example.com".into(),
                full_name: "Someone".into(),
                role,
                active: true,
                class_name: String::new(),
                major: String::new(),
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn test_parse_student_ids_dedupes_in_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = vec![
            format!(" {} ", b),
            a.to_string(),
            b.to_string(),
        ];
        assert_eq!(parse_student_ids(&raw).unwrap(), vec![b, a]);
    }

    #[test]
    fn test_parse_student_ids_rejects_blank() {
        let err = parse_student_ids(&["  ".to_string()]).unwrap_err();
        match err {
            ApiError::Validation(msg) => {
                assert_eq!(msg, "student_ids cannot contain blank values")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_student_ids_rejects_garbage() {
        assert!(matches!(
            parse_student_ids(&["not-a-uuid".to_string()]),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_student_consumes_for_self() {
        let student = actor(UserRole::Student);
        assert_eq!(
            resolve_consume_target(&student, None).unwrap(),
            student.user_id
        );
        assert_eq!(
            resolve_consume_target(&student, Some("  ")).unwrap(),
            student.user_id
        );
        let own = student.user_id.to_string();
        assert_eq!(
            resolve_consume_target(&student, Some(&own)).unwrap(),
            student.user_id
        );
    }

    #[test]
    fn test_student_cannot_consume_for_another() {
        let student = actor(UserRole::Student);
        let other = Uuid::new_v4().to_string();
        match resolve_consume_target(&student, Some(&other)).unwrap_err() {
            ApiError::Forbidden(msg) => {
                assert_eq!(msg, "cannot consume code for another student")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_staff_must_name_student() {
        let supervisor = actor(UserRole::Supervisor);
        assert!(matches!(
            resolve_consume_target(&supervisor, None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            resolve_consume_target(&supervisor, Some("xyz")),
            Err(ApiError::Validation(_))
        ));
        let target = Uuid::new_v4();
        assert_eq!(
            resolve_consume_target(&supervisor, Some(&target.to_string())).unwrap(),
            target
        );
    }
}
