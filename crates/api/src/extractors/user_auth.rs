//! User JWT authentication extractor.
//!
//! Validates the bearer token, then loads the user so the stored role and
//! active flag are authoritative over the token claims.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};
use domain::models::{User, UserRole};
use persistence::repositories::UserRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated, active caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: UserRole,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| websocket_query_token(parts))
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let claims = state
            .jwt
            .validate_token(&token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user_id = shared::jwt::extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user: User = UserRepository::new(state.pool.clone())
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?
            .into();

        if !user.active {
            return Err(ApiError::Unauthorized("User is inactive".to_string()));
        }

        if claims.role.parse::<UserRole>().ok() != Some(user.role) {
            tracing::debug!(
                user_id = %user_id,
                token_role = %claims.role,
                role = %user.role,
                "Token role differs from stored role"
            );
        }

        Ok(Self {
            user_id,
            role: user.role,
            user,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Browsers cannot set headers on a WebSocket handshake, so upgrade
/// requests may carry the token as `?token=`.
fn websocket_query_token(parts: &Parts) -> Option<String> {
    let is_upgrade = parts
        .headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);
    if !is_upgrade {
        return None;
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.trim().is_empty())
}
