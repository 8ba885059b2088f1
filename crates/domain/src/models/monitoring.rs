//! Live monitoring wire payloads and list models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::PageMeta;
use uuid::Uuid;

use super::room::RoomBlock;

/// Status block nested in monitoring rows and snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoringBlock {
    /// Status row id; `None` when the student has never reported.
    pub id: Option<Uuid>,
    pub app_version: String,
    pub locked: bool,
    pub blocked_from_exam: bool,
    pub force_logout_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Snapshot pushed to dashboard viewers when a student's status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitoringSnapshot {
    /// Student id, duplicated so dashboards can key rows by `id`.
    pub id: Uuid,
    pub student_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<Uuid>,
    pub locked: bool,
    pub blocked_from_exam: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_logout_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_version: String,
    pub monitoring: MonitoringBlock,
    pub room: RoomBlock,
}

/// Kind of message pushed to a student's own connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentMessageType {
    StatusUpdate,
}

/// Message pushed to a student's exam client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentStatusMessage {
    #[serde(rename = "type")]
    pub kind: StudentMessageType,
    pub locked: bool,
    pub blocked_from_exam: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_logout_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

/// Query parameters for `GET /api/monitoring/students`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMonitoringStudentsQuery {
    pub q: Option<String>,
    pub room_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub all: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

/// Sort keys accepted by the monitoring list.
pub const MONITORING_SORT_COLUMNS: &[&str] =
    &["updated_at", "full_name", "email", "kelas", "jurusan", "locked"];

/// One student row on the monitoring dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStudentItem {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(rename = "kelas")]
    pub class_name: String,
    #[serde(rename = "jurusan")]
    pub major: String,
    pub monitoring: MonitoringBlock,
    pub room: RoomBlock,
}

/// Response for `GET /api/monitoring/students`.
#[derive(Debug, Clone, Serialize)]
pub struct ListMonitoringStudentsResponse {
    pub data: Vec<MonitoringStudentItem>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_message_shape() {
        let msg = StudentStatusMessage {
            kind: StudentMessageType::StatusUpdate,
            locked: false,
            blocked_from_exam: false,
            force_logout_at: None,
            app_version: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "status_update",
                "locked": false,
                "blocked_from_exam": false
            })
        );
    }
}
