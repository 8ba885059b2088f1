//! Supervisor monitoring endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::exit_code::MessageResponse;
use domain::models::monitoring::{ListMonitoringStudentsQuery, ListMonitoringStudentsResponse};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::StudentStatusService;

fn service(state: &AppState) -> StudentStatusService {
    StudentStatusService::new(state.pool.clone(), state.broadcaster.clone())
}

/// Students with their live status. Dashboards call this after reconnecting.
///
/// GET /api/monitoring/students
pub async fn list_students(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListMonitoringStudentsQuery>,
) -> Result<Json<ListMonitoringStudentsResponse>, ApiError> {
    Ok(Json(service(&state).list_students(&user, &query).await?))
}

/// POST /api/monitoring/students/:id/force-logout
pub async fn force_logout(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(service(&state).force_logout(&user, student_id).await?))
}

/// POST /api/monitoring/students/:id/allow-exam
pub async fn allow_exam(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(service(&state).allow_exam(&user, student_id).await?))
}
