//! Room (exam session) domain models.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// An exam room.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Room identity attached to a student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRef {
    pub id: Uuid,
    pub name: String,
}

/// Room block as sent to dashboards.
///
/// Dashboard clients expect the block to be present even for students
/// without a room, so `None` serializes as `{"id":"","room_name":""}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomBlock(pub Option<RoomRef>);

impl Serialize for RoomBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("RoomBlock", 2)?;
        match &self.0 {
            Some(room) => {
                s.serialize_field("id", &room.id.to_string())?;
                s.serialize_field("room_name", &room.name)?;
            }
            None => {
                s.serialize_field("id", "")?;
                s.serialize_field("room_name", "")?;
            }
        }
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_block_assigned() {
        let id = Uuid::new_v4();
        let block = RoomBlock(Some(RoomRef {
            id,
            name: "Lab 1".into(),
        }));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["room_name"], "Lab 1");
    }

    #[test]
    fn test_room_block_unassigned_uses_empty_strings() {
        let json = serde_json::to_value(RoomBlock(None)).unwrap();
        assert_eq!(json, serde_json::json!({"id": "", "room_name": ""}));
    }
}
