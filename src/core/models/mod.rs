//! Domain records shared by the pipeline and the store

mod application;
mod event;
mod project;

pub use application::{AppDefaults, AppReference, Application, MetricSettings};
pub use event::{Event, EventType};
pub use project::Project;
