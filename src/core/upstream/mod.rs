//! Client for the external ingestion-analytics API
//!
//! Pages are pulled lazily by following `Link: <...>; rel="next"` headers,
//! and HTTP 429 responses are retried after the window announced by the
//! server.

mod client;
mod links;
mod types;


pub use client::{PageStream, PaginatedClient, rate_limit_wait};
pub use links::parse_next_link;
pub use types::{ProjectSummary, StatsGroup, StatsResponse};
