//! Scheduled jobs and the periodic scheduler

pub mod scheduler;
pub mod tasks;

pub use scheduler::Scheduler;
pub use tasks::{DetectionSummary, Job, JobContext};
