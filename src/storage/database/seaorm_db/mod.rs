// Module declarations
mod types;
mod connection;
mod convert;
mod project_ops;
mod app_ops;
mod event_ops;
mod store;

// Re-export public types
pub use types::{DatabaseBackendType, SeaOrmDatabase};
