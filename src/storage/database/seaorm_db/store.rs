use crate::core::detector::{DetectionParams, DetectionResult};
use crate::core::metrics::{CounterMap, Counters, MetricFamily};
use crate::core::models::{AppDefaults, Application, Event, Project};
use crate::storage::Store;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::SeaOrmDatabase;

#[async_trait]
impl Store for SeaOrmDatabase {
    async fn health_check(&self) -> Result<()> {
        self.ping().await
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.find_project(id).await
    }

    async fn get_or_create_project(&self, id: &str, params: &DetectionParams) -> Result<Project> {
        self.ensure_project(id, params).await
    }

    async fn list_project_ids(&self) -> Result<Vec<String>> {
        self.project_ids(false).await
    }

    async fn projects_without_slug(&self) -> Result<Vec<String>> {
        self.project_ids(true).await
    }

    async fn update_project_slugs(&self, slugs: &[(String, String)]) -> Result<u64> {
        self.set_project_slugs(slugs).await
    }

    async fn record_detection(
        &self,
        project_id: &str,
        result: &DetectionResult,
        events: &[Event],
    ) -> Result<()> {
        self.save_detection(project_id, result, events).await
    }

    async fn delete_projects_without_apps(&self) -> Result<u64> {
        self.delete_orphan_projects().await
    }

    async fn get_app(&self, reference: &str) -> Result<Option<Application>> {
        self.find_app(reference).await
    }

    async fn get_or_create_app(
        &self,
        reference: &str,
        defaults: &AppDefaults,
    ) -> Result<Application> {
        self.ensure_app(reference, defaults).await
    }

    async fn touch_app(&self, reference: &str, now: DateTime<Utc>) -> Result<()> {
        self.mark_app_seen(reference, now).await
    }

    async fn merge_counters(
        &self,
        reference: &str,
        family: MetricFamily,
        incoming: Counters,
        now: DateTime<Utc>,
    ) -> Result<CounterMap> {
        self.fold_counters(reference, family, incoming, now).await
    }

    async fn bump_apps(
        &self,
        references: &[String],
        rate: f64,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        self.open_windows(references, rate, until).await
    }

    async fn close_expired_windows(&self, now: DateTime<Utc>) -> Result<u64> {
        self.close_windows(now).await
    }

    async fn set_metric_collection(
        &self,
        reference: &str,
        family: MetricFamily,
        enabled: bool,
    ) -> Result<()> {
        self.save_metric_toggle(reference, family, enabled).await
    }

    async fn apps_without_project(&self) -> Result<Vec<String>> {
        self.unlinked_apps().await
    }

    async fn link_app(
        &self,
        reference: &str,
        project_id: &str,
        env: &str,
        command: &str,
    ) -> Result<()> {
        self.save_app_link(reference, project_id, env, command).await
    }

    async fn delete_apps_inactive_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.delete_stale_apps(cutoff).await
    }

    async fn last_event(&self, project_id: &str) -> Result<Option<Event>> {
        self.latest_event(project_id).await
    }

    async fn list_events(&self, project_id: &str) -> Result<Vec<Event>> {
        self.project_events(project_id).await
    }

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.delete_old_events(cutoff).await
    }
}
