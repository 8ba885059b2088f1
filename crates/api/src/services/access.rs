//! Room authority resolution for the current caller.

use domain::models::UserRole;
use domain::services::RoomScope;
use persistence::repositories::RoomRepository;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

/// Resolves the rooms a user may act on.
///
/// Admins are unrestricted, supervisors get the rooms they supervise and
/// students get an empty scope.
pub async fn authorized_rooms_for(
    pool: &PgPool,
    user_id: Uuid,
    role: UserRole,
) -> Result<RoomScope, sqlx::Error> {
    let supervised = match role {
        UserRole::Supervisor => RoomRepository::new(pool.clone())
            .supervised_room_ids(user_id)
            .await?,
        UserRole::Admin | UserRole::Student => Vec::new(),
    };
    Ok(RoomScope::for_role(role, supervised))
}

/// Rejects callers that are neither admin nor supervisor.
pub fn require_staff(role: UserRole) -> Result<(), ApiError> {
    if role.is_staff() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "admin or supervisor role required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_staff() {
        assert!(require_staff(UserRole::Admin).is_ok());
        assert!(require_staff(UserRole::Supervisor).is_ok());
        assert!(matches!(
            require_staff(UserRole::Student),
            Err(ApiError::Forbidden(_))
        ));
    }
}
