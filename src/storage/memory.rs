//! In-memory store

use super::Store;
use crate::core::detector::{DetectionParams, DetectionResult};
use crate::core::metrics::{CounterMap, Counters, MetricFamily, merge};
use crate::core::models::{AppDefaults, Application, Event, Project};
use crate::utils::error::{ControllerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
struct State {
    projects: BTreeMap<String, Project>,
    apps: BTreeMap<String, Application>,
    events: Vec<Event>,
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_app<T>(
        &self,
        reference: &str,
        f: impl FnOnce(&mut Application) -> T,
    ) -> Result<T> {
        let mut state = self.state.write();
        let app = state
            .apps
            .get_mut(reference)
            .ok_or_else(|| ControllerError::not_found(format!("application {}", reference)))?;
        Ok(f(app))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.state.read().projects.get(id).cloned())
    }

    async fn get_or_create_project(&self, id: &str, params: &DetectionParams) -> Result<Project> {
        let mut state = self.state.write();
        Ok(state
            .projects
            .entry(id.to_string())
            .or_insert_with(|| Project::new(id, *params))
            .clone())
    }

    async fn list_project_ids(&self) -> Result<Vec<String>> {
        Ok(self.state.read().projects.keys().cloned().collect())
    }

    async fn projects_without_slug(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .projects
            .values()
            .filter(|p| p.slug.is_none())
            .map(|p| p.id.clone())
            .collect())
    }

    async fn update_project_slugs(&self, slugs: &[(String, String)]) -> Result<u64> {
        let mut state = self.state.write();
        let mut updated = 0;
        for (id, slug) in slugs {
            if let Some(project) = state.projects.get_mut(id) {
                project.slug = Some(slug.clone());
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn record_detection(
        &self,
        project_id: &str,
        result: &DetectionResult,
        events: &[Event],
    ) -> Result<()> {
        let mut state = self.state.write();
        let project = state
            .projects
            .get_mut(project_id)
            .ok_or_else(|| ControllerError::not_found(format!("project {}", project_id)))?;
        project.detection_result = Some(result.clone());
        state.events.extend_from_slice(events);
        Ok(())
    }

    async fn delete_projects_without_apps(&self) -> Result<u64> {
        let mut state = self.state.write();
        let linked: HashSet<String> = state
            .apps
            .values()
            .filter_map(|a| a.project_id.clone())
            .collect();

        let before = state.projects.len();
        state.projects.retain(|id, _| linked.contains(id));
        let State {
            projects, events, ..
        } = &mut *state;
        events.retain(|e| projects.contains_key(&e.project_id));
        Ok((before - state.projects.len()) as u64)
    }

    async fn get_app(&self, reference: &str) -> Result<Option<Application>> {
        Ok(self.state.read().apps.get(reference).cloned())
    }

    async fn get_or_create_app(
        &self,
        reference: &str,
        defaults: &AppDefaults,
    ) -> Result<Application> {
        let mut state = self.state.write();
        Ok(state
            .apps
            .entry(reference.to_string())
            .or_insert_with(|| Application::new(reference, defaults))
            .clone())
    }

    async fn touch_app(&self, reference: &str, now: DateTime<Utc>) -> Result<()> {
        self.with_app(reference, |app| app.last_seen = Some(now))
    }

    async fn merge_counters(
        &self,
        reference: &str,
        family: MetricFamily,
        incoming: Counters,
        now: DateTime<Utc>,
    ) -> Result<CounterMap> {
        self.with_app(reference, |app| {
            let settings = app.metric_mut(family);
            let merged = merge(settings.counters.take(), Some(incoming), family);
            settings.counters = Some(Counters::Nested(merged.clone()));
            app.last_seen = Some(now);
            merged
        })
    }

    async fn bump_apps(
        &self,
        references: &[String],
        rate: f64,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        let mut state = self.state.write();
        let mut updated = 0;
        for reference in references {
            if let Some(app) = state.apps.get_mut(reference) {
                app.active_sample_rate = rate;
                app.active_window_end = Some(until);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn close_expired_windows(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write();
        let mut closed = 0;
        for app in state.apps.values_mut() {
            if app.active_window_end.is_some_and(|end| end < now) {
                app.active_sample_rate = app.default_sample_rate;
                app.active_window_end = None;
                closed += 1;
            }
        }
        Ok(closed)
    }

    async fn set_metric_collection(
        &self,
        reference: &str,
        family: MetricFamily,
        enabled: bool,
    ) -> Result<()> {
        self.with_app(reference, |app| app.metric_mut(family).collect = enabled)
    }

    async fn apps_without_project(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .apps
            .values()
            .filter(|a| a.project_id.is_none())
            .map(|a| a.reference.clone())
            .collect())
    }

    async fn link_app(
        &self,
        reference: &str,
        project_id: &str,
        env: &str,
        command: &str,
    ) -> Result<()> {
        if !self.state.read().projects.contains_key(project_id) {
            return Err(ControllerError::not_found(format!("project {}", project_id)));
        }
        self.with_app(reference, |app| {
            app.project_id = Some(project_id.to_string());
            app.env = Some(env.to_string());
            app.command = Some(command.to_string());
        })
    }

    async fn delete_apps_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write();
        let before = state.apps.len();
        state
            .apps
            .retain(|_, app| !app.last_seen.is_some_and(|seen| seen < cutoff));
        Ok((before - state.apps.len()) as u64)
    }

    async fn last_event(&self, project_id: &str) -> Result<Option<Event>> {
        Ok(self
            .state
            .read()
            .events
            .iter()
            .filter(|e| e.project_id == project_id)
            .max_by_key(|e| e.timestamp)
            .cloned())
    }

    async fn list_events(&self, project_id: &str) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state
            .read()
            .events
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write();
        let before = state.events.len();
        state.events.retain(|e| e.timestamp >= cutoff);
        Ok((before - state.events.len()) as u64)
    }
}
