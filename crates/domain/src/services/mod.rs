//! Domain services for the exam proctor backend.
//!
//! Pure business rules with no I/O: room scoping, status flag transitions
//! and broadcast payload construction.

pub mod access;
pub mod status_broadcast;
pub mod status_rules;

pub use access::RoomScope;
pub use status_broadcast::{build_status_broadcast, StatusBroadcast};
pub use status_rules::{apply_self_update, StatusChange, StatusFlags, StatusRuleViolation};
