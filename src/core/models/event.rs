use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Kind of spike transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// A spike started
    Firing,
    /// A spike ended
    Discard,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Firing => "FIRING",
            EventType::Discard => "DISCARD",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIRING" => Ok(EventType::Firing),
            "DISCARD" => Ok(EventType::Discard),
            other => Err(format!("Unknown event type: {}", other)),
        }
    }
}

/// Immutable timestamped spike transition of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub project_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(project_id: impl Into<String>, event_type: EventType, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            event_type,
            timestamp,
        }
    }
}
