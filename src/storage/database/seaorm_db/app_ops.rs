use crate::core::metrics::{CounterMap, Counters, MetricFamily, merge};
use crate::core::models::{AppDefaults, Application};
use crate::utils::error::{ControllerError, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, app};
use super::convert::app_active_model;
use super::types::{DatabaseBackendType, SeaOrmDatabase};

impl SeaOrmDatabase {
    /// Find an application by reference
    pub async fn find_app(&self, reference: &str) -> Result<Option<Application>> {
        debug!("Finding app: {}", reference);

        entities::App::find_by_id(reference.to_string())
            .one(&self.db)
            .await
            .map_err(ControllerError::Database)?
            .map(Application::try_from)
            .transpose()
    }

    /// Insert an application with defaults unless it exists, then return it
    pub async fn ensure_app(&self, reference: &str, defaults: &AppDefaults) -> Result<Application> {
        if let Some(app) = self.find_app(reference).await? {
            return Ok(app);
        }

        debug!("Creating app: {}", reference);
        let active_model = app_active_model(&Application::new(reference, defaults))?;

        entities::App::insert(active_model)
            .on_conflict(OnConflict::column(app::Column::Reference).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
            .map_err(ControllerError::Database)?;

        self.find_app(reference)
            .await?
            .ok_or_else(|| ControllerError::internal(format!("app {} vanished", reference)))
    }

    /// Apply column updates to one application
    async fn update_app(
        &self,
        reference: &str,
        columns: Vec<(app::Column, SimpleExpr)>,
    ) -> Result<()> {
        let mut update = entities::App::update_many();
        for (column, value) in columns {
            update = update.col_expr(column, value);
        }

        let updated = update
            .filter(app::Column::Reference.eq(reference))
            .exec(&self.db)
            .await
            .map_err(ControllerError::Database)?
            .rows_affected;

        if updated == 0 {
            return Err(ControllerError::not_found(format!("application {}", reference)));
        }
        Ok(())
    }

    pub async fn mark_app_seen(&self, reference: &str, now: DateTime<Utc>) -> Result<()> {
        self.update_app(reference, vec![(app::Column::LastSeen, Expr::value(now))])
            .await
    }

    /// Merge a report into the stored totals inside one transaction
    ///
    /// The row is locked on PostgreSQL; SQLite serializes writers itself.
    pub async fn fold_counters(
        &self,
        reference: &str,
        family: MetricFamily,
        incoming: Counters,
        now: DateTime<Utc>,
    ) -> Result<CounterMap> {
        let column = match family {
            MetricFamily::Wsgi => app::Column::WsgiMetrics,
            MetricFamily::Celery => app::Column::CeleryMetrics,
        };

        let txn = self.db.begin().await.map_err(ControllerError::Database)?;

        let mut query = entities::App::find_by_id(reference.to_string());
        if self.backend_type == DatabaseBackendType::PostgreSQL {
            query = query.lock_exclusive();
        }
        let model = query
            .one(&txn)
            .await
            .map_err(ControllerError::Database)?
            .ok_or_else(|| ControllerError::not_found(format!("application {}", reference)))?;
        let existing = Application::try_from(model)?.metric(family).counters.clone();

        let merged = merge(existing, Some(incoming), family);
        entities::App::update_many()
            .col_expr(column, Expr::value(serde_json::to_value(&merged)?))
            .col_expr(app::Column::LastSeen, Expr::value(now))
            .filter(app::Column::Reference.eq(reference))
            .exec(&txn)
            .await
            .map_err(ControllerError::Database)?;

        txn.commit().await.map_err(ControllerError::Database)?;
        Ok(merged)
    }

    pub async fn save_metric_toggle(
        &self,
        reference: &str,
        family: MetricFamily,
        enabled: bool,
    ) -> Result<()> {
        let column = match family {
            MetricFamily::Wsgi => app::Column::WsgiCollectMetrics,
            MetricFamily::Celery => app::Column::CeleryCollectMetrics,
        };
        self.update_app(reference, vec![(column, Expr::value(enabled))])
            .await
    }

    pub async fn save_app_link(
        &self,
        reference: &str,
        project_id: &str,
        env: &str,
        command: &str,
    ) -> Result<()> {
        self.update_app(
            reference,
            vec![
                (app::Column::ProjectId, Expr::value(project_id)),
                (app::Column::Env, Expr::value(env)),
                (app::Column::Command, Expr::value(command)),
            ],
        )
        .await
    }

    /// Open a bump window on the listed applications
    pub async fn open_windows(
        &self,
        references: &[String],
        rate: f64,
        until: DateTime<Utc>,
    ) -> Result<u64> {
        debug!("Bumping {} app(s) to {}", references.len(), rate);

        let result = entities::App::update_many()
            .col_expr(app::Column::ActiveSampleRate, Expr::value(rate))
            .col_expr(app::Column::ActiveWindowEnd, Expr::value(until))
            .filter(app::Column::Reference.is_in(references.iter().cloned()))
            .exec(&self.db)
            .await
            .map_err(ControllerError::Database)?;

        Ok(result.rows_affected)
    }

    /// Reset windows that ended before `now`
    pub async fn close_windows(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = entities::App::update_many()
            .col_expr(
                app::Column::ActiveSampleRate,
                Expr::col(app::Column::DefaultSampleRate).into(),
            )
            .col_expr(
                app::Column::ActiveWindowEnd,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(app::Column::ActiveWindowEnd.lt(now))
            .exec(&self.db)
            .await
            .map_err(ControllerError::Database)?;

        Ok(result.rows_affected)
    }

    pub async fn unlinked_apps(&self) -> Result<Vec<String>> {
        entities::App::find()
            .select_only()
            .column(app::Column::Reference)
            .filter(app::Column::ProjectId.is_null())
            .order_by_asc(app::Column::Reference)
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(ControllerError::Database)
    }

    pub async fn delete_stale_apps(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        debug!("Deleting apps last seen before {}", cutoff);

        let result = entities::App::delete_many()
            .filter(app::Column::LastSeen.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(ControllerError::Database)?;

        Ok(result.rows_affected)
    }
}
