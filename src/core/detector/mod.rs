//! Spike detection using a smoothed z-score
//!
//! For every point past the warm-up window, the detector compares the value
//! against the mean and standard deviation of the previous `lag` *filtered*
//! points. A point further than `threshold` standard deviations away is a
//! spike. Spikes enter the filtered series damped by `influence`, so a burst
//! does not immediately raise the bar for the next one.
//!
//! Tuning notes:
//!
//! - `lag`: how many periods the rolling statistics cover. Larger values
//!   smooth more and adapt more slowly to a new baseline.
//! - `threshold`: z-score above which a point is flagged.
//! - `influence`: `0.0` keeps spikes out of the baseline entirely (assumes
//!   the series returns to the same average); `1.0` lets them in at full
//!   weight so the baseline follows structural breaks.


use crate::core::models::Project;
use crate::core::upstream::StatsResponse;
use crate::utils::error::{ControllerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Detector parameters, stored per project
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Rolling window size, at least 2
    #[serde(default = "default_lag")]
    pub lag: usize,
    /// Number of standard deviations that makes a spike
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Weight of a spike in future statistics, in [0, 1]
    #[serde(default)]
    pub influence: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            lag: default_lag(),
            threshold: default_threshold(),
            influence: 0.0,
        }
    }
}

fn default_lag() -> usize {
    48
}

fn default_threshold() -> f64 {
    5.0
}

/// Raw detector output, one entry per input point
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOutput {
    pub signal: Vec<u8>,
    pub avg_filter: Vec<f64>,
    pub std_filter: Vec<f64>,
}

/// Full dump of a detection run, kept as the project snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub signal: Vec<u8>,
    pub avg_filter: Vec<f64>,
    pub std_filter: Vec<f64>,
    pub series: Vec<f64>,
    pub intervals: Vec<String>,
}

/// Signal value keyed by the start of its interval, in time order
pub type AnnotatedSignal = Vec<(DateTime<Utc>, u8)>;

/// Smoothed z-score spike detector
#[derive(Debug, Clone, Copy)]
pub struct SpikeDetector {
    params: DetectionParams,
}

impl SpikeDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self { params }
    }

    /// Build a detector from the parameters stored on a project
    pub fn from_project(project: &Project) -> Self {
        Self::new(project.detection_param)
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Run the detector over a raw series
    pub fn compute(&self, series: &[f64]) -> Result<DetectorOutput> {
        let DetectionParams {
            lag,
            threshold,
            influence,
        } = self.params;

        if lag < 2 {
            return Err(ControllerError::validation(format!(
                "lag must be at least 2, got {}",
                lag
            )));
        }
        if series.len() < lag {
            return Err(ControllerError::insufficient_data(format!(
                "series has {} points, lag requires {}",
                series.len(),
                lag
            )));
        }

        let (seed_mean, seed_std) = mean_stdev(&series[..lag]);
        if seed_std == 0.0 || !seed_std.is_finite() {
            return Err(ControllerError::insufficient_data(
                "warm-up window has zero variance",
            ));
        }

        let len = series.len();
        let mut signal = vec![0u8; len];
        let mut avg_filter = vec![0.0; len];
        let mut std_filter = vec![0.0; len];
        let mut filtered = series.to_vec();

        avg_filter[lag - 1] = seed_mean;
        std_filter[lag - 1] = seed_std;

        for i in lag..len {
            let value = series[i];
            if (value - avg_filter[i - 1]).abs() > threshold * std_filter[i - 1] {
                signal[i] = 1;
                filtered[i] = influence * value + (1.0 - influence) * filtered[i - 1];
            } else {
                filtered[i] = value;
            }

            let (mean, std) = mean_stdev(&filtered[i - lag..i]);
            avg_filter[i] = mean;
            std_filter[i] = std;
        }

        Ok(DetectorOutput {
            signal,
            avg_filter,
            std_filter,
        })
    }

    /// Run the detector on one outcome group of a stats payload
    ///
    /// Returns the signal keyed by interval start, and the dump to persist as
    /// the project snapshot.
    pub fn compute_stats(
        &self,
        stats: &StatsResponse,
        field: &str,
        outcome: &str,
    ) -> Result<(AnnotatedSignal, DetectionResult)> {
        let series = stats
            .series_for(outcome, field)
            .ok_or_else(|| ControllerError::missing_outcome(outcome))?;

        let output = self.compute(series)?;

        let annotated = stats
            .intervals
            .iter()
            .zip(output.signal.iter())
            .map(|(label, signal)| Ok((parse_interval(label)?, *signal)))
            .collect::<Result<AnnotatedSignal>>()?;

        let dump = DetectionResult {
            signal: output.signal,
            avg_filter: output.avg_filter,
            std_filter: output.std_filter,
            series: series.to_vec(),
            intervals: stats.intervals.clone(),
        };

        Ok((annotated, dump))
    }
}

fn parse_interval(label: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(label)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ControllerError::parsing(format!("Invalid interval '{}': {}", label, e)))
}

/// Mean and sample standard deviation
fn mean_stdev(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    if window.len() < 2 {
        return (mean, 0.0);
    }
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}
