//! HTTP route modules

pub mod apps;
pub mod health;
