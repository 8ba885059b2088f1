//! Room-based access scoping.
//!
//! Every room-level authorization decision goes through [`RoomScope`]:
//! exit code issuance and revocation, monitoring lists, supervisor actions
//! on students and dashboard connection filtering.

use std::collections::HashSet;
use uuid::Uuid;

use crate::models::UserRole;

/// Set of rooms a user may act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomScope {
    /// Every room, including codes and students without a room.
    All,
    /// Only the listed rooms.
    Rooms(HashSet<Uuid>),
}

impl RoomScope {
    /// Builds the scope for a role.
    ///
    /// `supervised_rooms` is only consulted for supervisors; students never
    /// receive room authority.
    pub fn for_role(role: UserRole, supervised_rooms: impl IntoIterator<Item = Uuid>) -> Self {
        match role {
            UserRole::Admin => RoomScope::All,
            UserRole::Supervisor => RoomScope::Rooms(supervised_rooms.into_iter().collect()),
            UserRole::Student => RoomScope::Rooms(HashSet::new()),
        }
    }

    /// True if the scope covers `room_id`.
    pub fn allows(&self, room_id: Uuid) -> bool {
        match self {
            RoomScope::All => true,
            RoomScope::Rooms(rooms) => rooms.contains(&room_id),
        }
    }

    /// True if the scope covers a possibly-absent room. Only [`RoomScope::All`]
    /// covers the absent room.
    pub fn allows_optional(&self, room_id: Option<Uuid>) -> bool {
        match room_id {
            Some(id) => self.allows(id),
            None => self.is_all(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RoomScope::All)
    }

    /// True when the scope covers nothing at all.
    pub fn is_empty(&self) -> bool {
        match self {
            RoomScope::All => false,
            RoomScope::Rooms(rooms) => rooms.is_empty(),
        }
    }

    /// Room ids for SQL filtering; `None` means unrestricted.
    pub fn room_ids(&self) -> Option<Vec<Uuid>> {
        match self {
            RoomScope::All => None,
            RoomScope::Rooms(rooms) => Some(rooms.iter().copied().collect()),
        }
    }
}
