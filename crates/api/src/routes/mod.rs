//! HTTP route handlers.

pub mod auth;
pub mod exit_codes;
pub mod health;
pub mod monitoring;
pub mod student_status;
pub mod ws;
