//! Payloads returned by the analytics API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of the organization stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Interval start labels, RFC 3339
    #[serde(default)]
    pub intervals: Vec<String>,
    #[serde(default)]
    pub groups: Vec<StatsGroup>,
}

/// One `groupBy` bucket of a stats response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsGroup {
    #[serde(default)]
    pub by: BTreeMap<String, String>,
    #[serde(default)]
    pub series: BTreeMap<String, Vec<f64>>,
}

impl StatsResponse {
    /// Series of `field` in the group whose outcome is `outcome`
    pub fn series_for(&self, outcome: &str, field: &str) -> Option<&[f64]> {
        self.groups
            .iter()
            .find(|group| group.by.get("outcome").map(String::as_str) == Some(outcome))
            .and_then(|group| group.series.get(field))
            .map(Vec::as_slice)
    }
}

/// Entry of the project listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub slug: String,
}
