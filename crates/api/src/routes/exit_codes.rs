//! Exit code endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::exit_code::{
    ConsumeExitCodeRequest, ConsumeExitCodeResponse, GenerateExitCodesRequest,
    GenerateExitCodesResponse, ListExitCodesQuery, ListExitCodesResponse, MessageResponse,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::ExitCodeService;

fn service(state: &AppState) -> ExitCodeService {
    ExitCodeService::new(state.pool.clone(), state.broadcaster.clone())
}

/// Generate exit codes for a room.
///
/// POST /api/exit-codes
pub async fn generate(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<GenerateExitCodesRequest>,
) -> Result<(StatusCode, Json<GenerateExitCodesResponse>), ApiError> {
    let response = service(&state).generate(&user, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List exit codes visible to the caller.
///
/// GET /api/exit-codes
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListExitCodesQuery>,
) -> Result<Json<ListExitCodesResponse>, ApiError> {
    Ok(Json(service(&state).list(&user, &query).await?))
}

/// Consume a code.
///
/// POST /api/exit-codes/consume
///
/// Returns 409 when the code does not exist or was already used.
pub async fn consume(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<ConsumeExitCodeRequest>,
) -> Result<Json<ConsumeExitCodeResponse>, ApiError> {
    Ok(Json(service(&state).consume(&user, &request).await?))
}

/// Revoke a code.
///
/// POST /api/exit-codes/:id/revoke
pub async fn revoke(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(service(&state).revoke(&user, code_id).await?))
}
