//! Application services.
//!
//! Services own the transactional workflows behind the HTTP handlers and
//! report failures as [`crate::error::ApiError`].

pub mod access;
pub mod broadcast;
pub mod exit_codes;
pub mod student_status;

pub use access::{authorized_rooms_for, require_staff};
pub use broadcast::StatusBroadcaster;
pub use exit_codes::ExitCodeService;
pub use student_status::StudentStatusService;
