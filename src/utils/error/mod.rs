//! Error handling for the controller
//!
//! This module defines the error type shared by every component, and its
//! mapping onto HTTP responses.

mod response;
mod types;

pub use response::{ErrorDetail, ErrorResponse};
pub use types::{ControllerError, Result};
