//! Identity endpoint.

use axum::Json;
use domain::models::user::MeResponse;

use crate::extractors::CurrentUser;

/// The identity resolved from the presented token.
///
/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> Json<MeResponse> {
    Json(MeResponse::from(user.user))
}
