//! Per-application counter aggregation
//!
//! Clients report counters per metric family. Reports are merged into a
//! running total of shape `group -> key -> count`. Totals written by older
//! clients are a flat `key -> count` map; they are normalized to a single
//! group named after the family before merging.

mod aggregator;

pub use aggregator::MetricsAggregator;

use crate::utils::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Counts of one group
pub type CounterGroup = BTreeMap<String, u64>;

/// Normalized running total
pub type CounterMap = BTreeMap<String, CounterGroup>;

/// Class of reported counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricFamily {
    /// Request-serving metrics
    Wsgi,
    /// Background-worker metrics
    Celery,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 2] = [MetricFamily::Wsgi, MetricFamily::Celery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wsgi => "WSGI",
            Self::Celery => "CELERY",
        }
    }

    /// Group that a legacy flat map is folded into
    pub fn legacy_group(&self) -> &'static str {
        match self {
            Self::Wsgi => "path",
            Self::Celery => "task",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricFamily {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "WSGI" => Ok(Self::Wsgi),
            "CELERY" => Ok(Self::Celery),
            other => Err(ControllerError::validation(format!(
                "Unknown metric type: {}",
                other
            ))),
        }
    }
}

/// Counter payload in either accepted shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Counters {
    Nested(CounterMap),
    Flat(CounterGroup),
}

impl Default for Counters {
    fn default() -> Self {
        Self::Nested(CounterMap::new())
    }
}

impl Counters {
    /// Convert to the nested shape
    pub fn normalize(self, family: MetricFamily) -> CounterMap {
        match self {
            Self::Nested(map) => map,
            Self::Flat(group) if group.is_empty() => CounterMap::new(),
            Self::Flat(group) => CounterMap::from([(family.legacy_group().to_string(), group)]),
        }
    }
}

/// Body of a metrics report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    #[serde(rename = "type")]
    pub family: MetricFamily,
    #[serde(default)]
    pub data: Counters,
}

/// Sum two counter payloads over the union of their groups and keys
pub fn merge(
    existing: Option<Counters>,
    incoming: Option<Counters>,
    family: MetricFamily,
) -> CounterMap {
    let mut total = existing.map(|c| c.normalize(family)).unwrap_or_default();

    for (group, counts) in incoming.map(|c| c.normalize(family)).unwrap_or_default() {
        let target = total.entry(group).or_default();
        for (key, count) in counts {
            let slot = target.entry(key).or_insert(0);
            *slot = slot.saturating_add(count);
        }
    }

    total
}
