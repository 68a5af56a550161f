//! Common test utilities for sampling-controller
//!
//! - In-memory SQLite database support
//! - Configuration, stats payload and controller factories

pub mod fixtures;

pub use database::TestDatabase;
pub use fixtures::{StatsFactory, TestController, test_config};

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
