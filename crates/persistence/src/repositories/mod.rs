//! Repository implementations for database operations.

pub mod exit_code;
pub mod room;
pub mod student_status;
pub mod user;

pub use exit_code::{ExitCodeListFilter, ExitCodeRepository};
pub use room::RoomRepository;
pub use student_status::{MonitoringListFilter, StudentStatusRepository};
pub use user::{NewUser, UserRepository};
