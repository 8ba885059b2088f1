//! Student self-status endpoint handlers.

use axum::{extract::State, Json};
use domain::models::student_status::UpdateStudentStatusRequest;
use domain::models::StudentStatusSnapshot;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::StudentStatusService;

/// GET /api/student/status
pub async fn get_status(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<StudentStatusSnapshot>, ApiError> {
    let service = StudentStatusService::new(state.pool.clone(), state.broadcaster.clone());
    Ok(Json(service.get_self(&user).await?))
}

/// PUT /api/student/status
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<UpdateStudentStatusRequest>,
) -> Result<Json<StudentStatusSnapshot>, ApiError> {
    let service = StudentStatusService::new(state.pool.clone(), state.broadcaster.clone());
    Ok(Json(service.update_self(&user, &request).await?))
}
