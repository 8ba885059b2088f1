//! Transition rules for self-reported student status flags.
//!
//! Self reports are checked here so a student is never locked into an exam
//! they are blocked from. Supervisor actions and code consumption write the
//! flags with single upserts that never set both.

use thiserror::Error;

use crate::models::UserRole;

/// The two mutually constrained status flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub locked: bool,
    pub blocked_from_exam: bool,
}

/// Flag changes requested by a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusChange {
    pub locked: Option<bool>,
    pub blocked_from_exam: Option<bool>,
}

/// A requested change that the rules reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusRuleViolation {
    #[error("blocked_from_exam_cannot_be_cleared_by_student")]
    StudentCannotClearBlock,
    #[error("blocked_by_supervisor")]
    BlockedBySupervisor,
}

/// Applies a self-reported change from a user with `role`.
///
/// Students may set but never clear the block. Locking is refused while the
/// resulting state is blocked, and setting the block without an explicit
/// lock value releases the lock.
pub fn apply_self_update(
    current: StatusFlags,
    change: StatusChange,
    role: UserRole,
) -> Result<StatusFlags, StatusRuleViolation> {
    if role == UserRole::Student && change.blocked_from_exam == Some(false) {
        return Err(StatusRuleViolation::StudentCannotClearBlock);
    }

    let blocked = change.blocked_from_exam.unwrap_or(current.blocked_from_exam);
    let locked = match change.locked {
        Some(true) if blocked => return Err(StatusRuleViolation::BlockedBySupervisor),
        Some(value) => value,
        None if blocked => false,
        None => current.locked,
    };

    Ok(StatusFlags {
        locked,
        blocked_from_exam: blocked,
    })
}
