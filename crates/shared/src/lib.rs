//! Shared utilities and common types for the exam proctor backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Exit code generation from an unambiguous alphabet
//! - JWT access token validation
//! - Page/limit pagination and sort parameters
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;
