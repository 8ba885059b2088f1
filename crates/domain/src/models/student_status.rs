//! Student device status models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Persisted status of one student's exam client.
///
/// Never `locked` while `blocked_from_exam`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentStatus {
    pub id: Uuid,
    pub student_id: Uuid,
    pub app_version: String,
    pub locked: bool,
    pub blocked_from_exam: bool,
    pub force_logout_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for `PUT /api/student/status`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateStudentStatusRequest {
    #[validate(custom(function = "shared::validation::validate_app_version"))]
    pub app_version: Option<String>,
    pub locked: Option<bool>,
    pub blocked_from_exam: Option<bool>,
}

/// Status as reported back to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStatusSnapshot {
    pub app_version: String,
    pub locked: bool,
    pub blocked_from_exam: bool,
    pub force_logout_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&StudentStatus> for StudentStatusSnapshot {
    fn from(status: &StudentStatus) -> Self {
        Self {
            app_version: status.app_version.clone(),
            locked: status.locked,
            blocked_from_exam: status.blocked_from_exam,
            force_logout_at: status.force_logout_at,
            updated_at: Some(status.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_zeroed() {
        let json = serde_json::to_value(StudentStatusSnapshot::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "app_version": "",
                "locked": false,
                "blocked_from_exam": false,
                "force_logout_at": null,
                "updated_at": null
            })
        );
    }

    #[test]
    fn test_update_request_rejects_long_version() {
        let req = UpdateStudentStatusRequest {
            app_version: Some("x".repeat(100)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
