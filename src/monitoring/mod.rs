//! Process-wide counters exported in Prometheus text format

mod counters;

pub use counters::{ControllerMetrics, MetricsSnapshot};
