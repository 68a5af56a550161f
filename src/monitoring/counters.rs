use serde::Serialize;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters shared by the pipeline, jobs and HTTP handlers
#[derive(Debug)]
pub struct ControllerMetrics {
    started_at: Instant,
    detection_runs: AtomicU64,
    detection_failures: AtomicU64,
    events_created: AtomicU64,
    upstream_requests: AtomicU64,
    upstream_rate_limited: AtomicU64,
    reports_merged: AtomicU64,
    windows_closed: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub detection_runs: u64,
    pub detection_failures: u64,
    pub events_created: u64,
    pub upstream_requests: u64,
    pub upstream_rate_limited: u64,
    pub reports_merged: u64,
    pub windows_closed: u64,
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            detection_runs: AtomicU64::new(0),
            detection_failures: AtomicU64::new(0),
            events_created: AtomicU64::new(0),
            upstream_requests: AtomicU64::new(0),
            upstream_rate_limited: AtomicU64::new(0),
            reports_merged: AtomicU64::new(0),
            windows_closed: AtomicU64::new(0),
        }
    }
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished detection run
    pub fn record_detection(&self, ok: bool, events: u64) {
        self.detection_runs.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.detection_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.events_created.fetch_add(events, Ordering::Relaxed);
    }

    pub fn record_upstream_request(&self) {
        self.upstream_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.upstream_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report(&self) {
        self.reports_merged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_windows_closed(&self, count: u64) {
        self.windows_closed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_seconds: self.started_at.elapsed().as_secs(),
            detection_runs: self.detection_runs.load(Ordering::Relaxed),
            detection_failures: self.detection_failures.load(Ordering::Relaxed),
            events_created: self.events_created.load(Ordering::Relaxed),
            upstream_requests: self.upstream_requests.load(Ordering::Relaxed),
            upstream_rate_limited: self.upstream_rate_limited.load(Ordering::Relaxed),
            reports_merged: self.reports_merged.load(Ordering::Relaxed),
            windows_closed: self.windows_closed.load(Ordering::Relaxed),
        }
    }

    /// Render every counter in Prometheus text exposition format
    pub fn export_prometheus(&self) -> String {
        let s = self.snapshot();
        let rows: [(&str, &str, &str, u64); 8] = [
            ("uptime_seconds", "counter", "Seconds since the process started", s.uptime_seconds),
            ("detection_runs_total", "counter", "Detection runs attempted", s.detection_runs),
            ("detection_failures_total", "counter", "Detection runs that failed", s.detection_failures),
            ("events_created_total", "counter", "Spike events recorded", s.events_created),
            ("upstream_requests_total", "counter", "Requests sent to the analytics API", s.upstream_requests),
            ("upstream_rate_limited_total", "counter", "HTTP 429 responses waited out", s.upstream_rate_limited),
            ("reports_merged_total", "counter", "Metric reports merged", s.reports_merged),
            ("windows_closed_total", "counter", "Bump windows closed by the sweep", s.windows_closed),
        ];

        let mut output = String::new();
        for (name, kind, help, value) in rows {
            let _ = writeln!(output, "# HELP sampling_controller_{} {}", name, help);
            let _ = writeln!(output, "# TYPE sampling_controller_{} {}", name, kind);
            let _ = writeln!(output, "sampling_controller_{} {}", name, value);
        }
        output
    }
}
