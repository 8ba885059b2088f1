//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod exit_code;
pub mod room;
pub mod student_status;
pub mod user;

pub use exit_code::{ExitCodeEntity, ExitCodeWithDetailsEntity};
pub use room::{RoomEntity, RoomMembershipEntity};
pub use student_status::{MonitoringStudentEntity, StudentStatusEntity};
pub use user::{UserEntity, UserRoleDb};
