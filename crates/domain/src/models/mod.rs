//! Domain models for the exam proctor backend.

pub mod exit_code;
pub mod monitoring;
pub mod room;
pub mod student_status;
pub mod user;

pub use exit_code::{ExitCode, ExitCodeStatus};
pub use monitoring::{MonitoringSnapshot, StudentStatusMessage};
pub use room::{Room, RoomBlock, RoomRef};
pub use student_status::{StudentStatus, StudentStatusSnapshot};
pub use user::{User, UserRole};
