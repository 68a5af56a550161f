//! Per-application sample rate state and the global panic override

mod controller;
mod panic;

pub use controller::{
    AppSettings, BumpRequest, RateState, SampleRateController, effective_sample_rate,
};
pub use panic::{InMemoryPanicFlag, PanicFlag};
