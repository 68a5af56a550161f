//! Turns detector signals into spike start/end events
//!
//! Only transitions are recorded. Any transition at or before the latest
//! recorded event is considered already represented, so re-running detection
//! over an overlapping window never duplicates or reorders history.

use crate::core::detector::{AnnotatedSignal, DetectionResult};
use crate::core::models::{Event, EventType, Project};
use crate::storage::Store;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Events needed to represent the transitions of `signal`
///
/// The signal is assumed to start at 0. Transitions timestamped at or before
/// `last_event` still move the previous value but emit nothing.
pub fn transitions(
    project_id: &str,
    signal: &AnnotatedSignal,
    last_event: Option<DateTime<Utc>>,
) -> Vec<Event> {
    let mut previous = 0u8;
    let mut events = Vec::new();

    for (timestamp, value) in signal {
        if *value == previous {
            continue;
        }
        previous = *value;

        if last_event.is_some_and(|last| *timestamp <= last) {
            continue;
        }

        let event_type = if *value == 0 {
            EventType::Discard
        } else {
            EventType::Firing
        };
        events.push(Event::new(project_id, event_type, *timestamp));
    }

    events
}

/// Persists the events and snapshot of a detection run
#[derive(Clone)]
pub struct EventTransitionEngine {
    store: Arc<dyn Store>,
}

impl EventTransitionEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record the run: new events and the snapshot are written atomically
    pub async fn apply(
        &self,
        project: &Project,
        signal: &AnnotatedSignal,
        dump: &DetectionResult,
    ) -> Result<Vec<Event>> {
        let last = self.store.last_event(&project.id).await?;
        let events = transitions(&project.id, signal, last.map(|e| e.timestamp));

        self.store.record_detection(&project.id, dump, &events).await?;
        debug!(
            project = %project.id,
            "Recorded detection with {} new event(s)",
            events.len()
        );
        Ok(events)
    }
}
