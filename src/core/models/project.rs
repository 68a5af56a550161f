use crate::core::detector::{DetectionParams, DetectionResult};
use serde::{Deserialize, Serialize};

/// Grouping unit of the analytics API, owner of detection state and events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// External id, primary key
    pub id: String,
    /// Human-readable slug, back-filled from the API
    pub slug: Option<String>,
    pub detection_param: DetectionParams,
    /// Snapshot of the latest detection run
    pub detection_result: Option<DetectionResult>,
}

impl Project {
    pub fn new(id: impl Into<String>, detection_param: DetectionParams) -> Self {
        Self {
            id: id.into(),
            slug: None,
            detection_param,
            detection_result: None,
        }
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Project({} - {})",
            self.id,
            self.slug.as_deref().unwrap_or("Pending")
        )
    }
}
