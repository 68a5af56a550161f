//! Core adaptive-sampling pipeline
//!
//! - [`detector`]: smoothed z-score spike detection over usage series
//! - [`events`]: detector signal to deduplicated spike events
//! - [`sampling`]: per-application sample rate state and the panic override
//! - [`metrics`]: merging of reported per-application counters
//! - [`upstream`]: paginated, rate-limit aware analytics API client

pub mod detector;
pub mod events;
pub mod metrics;
pub mod models;
pub mod sampling;
pub mod upstream;
