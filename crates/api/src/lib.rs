//! Exam proctoring backend: exit codes, student status and live monitoring.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod services;
