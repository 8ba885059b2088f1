//! Domain layer for the exam proctor backend.
//!
//! This crate contains:
//! - Domain models (users, rooms, exit codes, student status)
//! - Wire payloads for live monitoring
//! - Business rules (room scoping, status transitions)

pub mod models;
pub mod services;
