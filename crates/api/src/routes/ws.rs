//! WebSocket upgrade handlers for the live hubs.
//!
//! Authorization runs before the upgrade so refused callers get a normal
//! JSON error. Hub registration happens once the socket is live.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use domain::models::UserRole;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::realtime::{serve_socket, ConnectionSettings};
use crate::services::{authorized_rooms_for, require_staff};

fn upgrade(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    max_message_bytes: usize,
) -> Result<WebSocketUpgrade, ApiError> {
    ws.map(|ws| ws.max_message_size(max_message_bytes))
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// Dashboard stream of student status snapshots.
///
/// GET /api/ws/monitoring
///
/// The viewer's room scope is fixed at connection time.
pub async fn monitoring_socket(
    State(state): State<AppState>,
    user: CurrentUser,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    require_staff(user.role)?;

    let scope = authorized_rooms_for(&state.pool, user.user_id, user.role).await?;
    if scope.is_empty() {
        return Err(ApiError::Forbidden("no rooms assigned".to_string()));
    }

    let realtime = state.config.realtime.clone();
    let ws = upgrade(ws, realtime.max_message_bytes)?;
    let settings = ConnectionSettings::from(&realtime);
    let hub = state.monitoring.clone();
    let user_id = user.user_id;

    Ok(ws.on_upgrade(move |socket| async move {
        let session = match hub.register(scope, realtime.send_buffer_size).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Monitoring registration failed");
                return;
            }
        };
        let client_id = session.id;
        tracing::info!(user_id = %user_id, client_id = %client_id, "Monitoring connection opened");

        serve_socket(socket, session, settings).await;
        hub.unregister(client_id).await;
        tracing::info!(user_id = %user_id, client_id = %client_id, "Monitoring connection closed");
    }))
}

/// Personal status channel of a student device.
///
/// GET /api/ws/student
///
/// A new connection replaces any existing one for the same student.
pub async fn student_socket(
    State(state): State<AppState>,
    user: CurrentUser,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    if user.role != UserRole::Student {
        return Err(ApiError::Forbidden("student role required".to_string()));
    }

    let realtime = state.config.realtime.clone();
    let ws = upgrade(ws, realtime.max_message_bytes)?;
    let settings = ConnectionSettings::from(&realtime);
    let hub = state.students.clone();
    let student_id = user.user_id;

    Ok(ws.on_upgrade(move |socket| async move {
        let session = match hub
            .register(student_id, realtime.student_send_buffer_size)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(student_id = %student_id, error = %e, "Student registration failed");
                return;
            }
        };
        let client_id = session.id;
        tracing::info!(student_id = %student_id, client_id = %client_id, "Student connection opened");

        serve_socket(socket, session, settings).await;
        hub.unregister(student_id, client_id).await;
        tracing::info!(student_id = %student_id, client_id = %client_id, "Student connection closed");
    }))
}
