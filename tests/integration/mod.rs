//! Integration tests for sampling-controller
//!
//! These tests drive real components together: the in-memory and SQLite
//! stores, the HTTP routes and a mock analytics API.

pub mod config_tests;
pub mod database_tests;
pub mod job_tests;
pub mod sampling_tests;
pub mod server_tests;
pub mod upstream_tests;
