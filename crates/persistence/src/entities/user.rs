//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::UserRole;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for user_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum UserRoleDb {
    #[sqlx(rename = "admin")]
    Admin,
    #[sqlx(rename = "pengawas")]
    Supervisor,
    #[sqlx(rename = "siswa")]
    Student,
}

impl From<UserRoleDb> for UserRole {
    fn from(db_role: UserRoleDb) -> Self {
        match db_role {
            UserRoleDb::Admin => UserRole::Admin,
            UserRoleDb::Supervisor => UserRole::Supervisor,
            UserRoleDb::Student => UserRole::Student,
        }
    }
}

impl From<UserRole> for UserRoleDb {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => UserRoleDb::Admin,
            UserRole::Supervisor => UserRoleDb::Supervisor,
            UserRole::Student => UserRoleDb::Student,
        }
    }
}

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRoleDb,
    pub active: bool,
    pub class_name: String,
    pub major: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            full_name: entity.full_name,
            role: entity.role.into(),
            active: entity.active,
            class_name: entity.class_name,
            major: entity.major,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_db_enum() {
        for role in [UserRole::Admin, UserRole::Supervisor, UserRole::Student] {
            let db: UserRoleDb = role.into();
            assert_eq!(UserRole::from(db), role);
        }
    }
}
