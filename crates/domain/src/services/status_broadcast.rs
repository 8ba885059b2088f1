//! Builds the payloads pushed to live connections after a status change.

use crate::models::monitoring::{MonitoringBlock, StudentMessageType};
use crate::models::{MonitoringSnapshot, RoomBlock, RoomRef, StudentStatus, StudentStatusMessage};

/// Both views of one status change, built from the same row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBroadcast {
    pub snapshot: MonitoringSnapshot,
    pub student_message: StudentStatusMessage,
}

impl StatusBroadcast {
    /// Room used to filter dashboard viewers; `None` reaches only
    /// unrestricted viewers.
    pub fn room_id(&self) -> Option<uuid::Uuid> {
        self.snapshot.room_id
    }
}

/// Builds the dashboard snapshot and the student notification.
pub fn build_status_broadcast(status: &StudentStatus, room: Option<RoomRef>) -> StatusBroadcast {
    let snapshot = MonitoringSnapshot {
        id: status.student_id,
        student_id: status.student_id,
        room_id: room.as_ref().map(|r| r.id),
        locked: status.locked,
        blocked_from_exam: status.blocked_from_exam,
        updated_at: status.updated_at,
        force_logout_at: status.force_logout_at,
        app_version: status.app_version.clone(),
        monitoring: MonitoringBlock {
            id: Some(status.id),
            app_version: status.app_version.clone(),
            locked: status.locked,
            blocked_from_exam: status.blocked_from_exam,
            force_logout_at: status.force_logout_at,
            updated_at: Some(status.updated_at),
        },
        room: RoomBlock(room),
    };

    let student_message = StudentStatusMessage {
        kind: StudentMessageType::StatusUpdate,
        locked: status.locked,
        blocked_from_exam: status.blocked_from_exam,
        force_logout_at: status.force_logout_at,
        app_version: Some(status.app_version.clone()).filter(|v| !v.is_empty()),
    };

    StatusBroadcast {
        snapshot,
        student_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn status(app_version: &str) -> StudentStatus {
        let now = Utc::now();
        StudentStatus {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            app_version: app_version.into(),
            locked: false,
            blocked_from_exam: true,
            force_logout_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_snapshot_with_room() {
        let st = status("2.1.0");
        let room_id = Uuid::new_v4();
        let out = build_status_broadcast(
            &st,
            Some(RoomRef {
                id: room_id,
                name: "Lab A".into(),
            }),
        );

        assert_eq!(out.room_id(), Some(room_id));
        let json = serde_json::to_value(&out.snapshot).unwrap();
        assert_eq!(json["id"], st.student_id.to_string());
        assert_eq!(json["student_id"], st.student_id.to_string());
        assert_eq!(json["room_id"], room_id.to_string());
        assert_eq!(json["app_version"], "2.1.0");
        assert_eq!(json["blocked_from_exam"], true);
        assert_eq!(json["monitoring"]["id"], st.id.to_string());
        assert_eq!(json["room"]["room_name"], "Lab A");
    }

    #[test]
    fn test_snapshot_without_room_or_version() {
        let st = status("");
        let out = build_status_broadcast(&st, None);

        assert_eq!(out.room_id(), None);
        let json = serde_json::to_value(&out.snapshot).unwrap();
        assert!(json.get("room_id").is_none());
        assert!(json.get("app_version").is_none());
        assert_eq!(json["monitoring"]["app_version"], "");
        assert_eq!(json["room"], serde_json::json!({"id": "", "room_name": ""}));
    }

    #[test]
    fn test_student_message() {
        let st = status("");
        let out = build_status_broadcast(&st, None);
        let json = serde_json::to_value(&out.student_message).unwrap();

        assert_eq!(json["type"], "status_update");
        assert_eq!(json["locked"], false);
        assert_eq!(json["blocked_from_exam"], true);
        assert!(json.get("force_logout_at").is_some());
        assert!(json.get("app_version").is_none());
    }
}
