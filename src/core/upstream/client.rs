//! Paginated, rate-limit aware HTTP client

use super::links::parse_next_link;
use super::types::{ProjectSummary, StatsResponse};
use crate::config::UpstreamConfig;
use crate::config::models::StatsQueryConfig;
use crate::monitoring::ControllerMetrics;
use crate::utils::error::{ControllerError, Result};
use chrono::{DateTime, Utc};
use futures::Stream;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Lazy sequence of page bodies
pub type PageStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// Shared client for the analytics API
///
/// Holds no per-call state; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PaginatedClient {
    http: Client,
    base: Url,
    token: String,
    organization_slug: String,
    reset_header: String,
    stats: StatsQueryConfig,
    metrics: Arc<ControllerMetrics>,
}

impl PaginatedClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Self::with_metrics(config, Arc::new(ControllerMetrics::default()))
    }

    pub fn with_metrics(config: &UpstreamConfig, metrics: Arc<ControllerMetrics>) -> Result<Self> {
        let mut host = config.host.clone();
        if !host.ends_with('/') {
            host.push('/');
        }
        let base = Url::parse(&host)
            .map_err(|e| ControllerError::config(format!("Invalid upstream host: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ControllerError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            token: config.token.clone(),
            organization_slug: config.organization_slug.clone(),
            reset_header: config.rate_limit_reset_header.clone(),
            stats: config.stats.clone(),
            metrics,
        })
    }

    pub fn stats_query(&self) -> &StatsQueryConfig {
        &self.stats
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| ControllerError::parsing(format!("Invalid resource path '{}': {}", path, e)))
    }

    /// Send one request, waiting out 429 responses until something else comes back
    async fn call(&self, method: Method, url: Url, query: &[(&str, String)]) -> Result<Response> {
        loop {
            self.metrics.record_upstream_request();
            let response = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&self.token)
                .query(query)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let reset = response
                    .headers()
                    .get(self.reset_header.as_str())
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<i64>().ok());
                let wait = rate_limit_wait(reset, Utc::now());
                self.metrics.record_rate_limited();
                error!("Got HTTP 429 on {} waiting {:?}", url, wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                return Err(ControllerError::upstream(status.as_u16(), url.as_str()));
            }

            debug!("{} {} -> {}", method, url, status);
            return Ok(response);
        }
    }

    /// Pages of a list resource, fetched on demand
    pub fn list_resource(&self, path: &str) -> PageStream {
        let client = self.clone();
        let start = self.resolve(path);

        Box::pin(async_stream::try_stream! {
            let mut next = Some(start?);
            while let Some(url) = next.take() {
                let response = client.call(Method::GET, url.clone(), &[]).await?;
                next = parse_next_link(response.headers(), &url);
                let page: Value = response.json().await?;
                yield page;
            }
        })
    }

    /// Pages of the organization's project listing
    pub fn list_projects(&self) -> PageStream {
        self.list_resource("projects/")
    }

    /// Decode one project-listing page
    pub fn project_page(page: Value) -> Result<Vec<ProjectSummary>> {
        Ok(serde_json::from_value(page)?)
    }

    /// Usage stats of one project over the configured period
    pub async fn fetch_stats(&self, project_id: &str) -> Result<StatsResponse> {
        let url = self.resolve(&format!(
            "organizations/{}/stats_v2/",
            self.organization_slug
        ))?;

        let mut query: Vec<(&str, String)> = vec![("field", self.stats.field.clone())];
        query.extend(self.stats.group_by.iter().map(|g| ("groupBy", g.clone())));
        query.push(("interval", self.stats.interval.clone()));
        query.push(("project", project_id.to_string()));
        query.push(("statsPeriod", self.stats.stats_period.clone()));
        query.push(("category", self.stats.category.clone()));

        let response = self.call(Method::GET, url, &query).await?;
        Ok(response.json().await?)
    }
}

/// Time to wait before retrying a rate-limited request
///
/// `reset` is the epoch second at which the window ends. Missing or past
/// values wait one second.
pub fn rate_limit_wait(reset: Option<i64>, now: DateTime<Utc>) -> Duration {
    let floor = Duration::from_secs(1);
    reset
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .and_then(|end| (end - now).to_std().ok())
        .map_or(floor, |wait| wait.max(floor))
}
