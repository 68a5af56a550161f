use crate::core::detector::{DetectionParams, DetectionResult};
use crate::core::models::{Event, Project};
use crate::utils::error::{ControllerError, Result};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use std::collections::HashSet;
use tracing::debug;

use super::super::entities::{self, app, event, project};
use super::convert::event_active_model;
use super::types::SeaOrmDatabase;

impl SeaOrmDatabase {
    /// Find a project by id
    pub async fn find_project(&self, id: &str) -> Result<Option<Project>> {
        debug!("Finding project: {}", id);

        entities::Project::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(ControllerError::Database)?
            .map(Project::try_from)
            .transpose()
    }

    /// Insert a project unless it exists, then return it
    pub async fn ensure_project(&self, id: &str, params: &DetectionParams) -> Result<Project> {
        if let Some(project) = self.find_project(id).await? {
            return Ok(project);
        }

        debug!("Creating project: {}", id);
        let active_model = project::ActiveModel {
            id: Set(id.to_string()),
            slug: Set(None),
            detection_param: Set(serde_json::to_value(params)?),
            detection_result: Set(None),
        };

        entities::Project::insert(active_model)
            .on_conflict(OnConflict::column(project::Column::Id).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
            .map_err(ControllerError::Database)?;

        self.find_project(id)
            .await?
            .ok_or_else(|| ControllerError::internal(format!("project {} vanished", id)))
    }

    /// Ids of every project
    pub async fn project_ids(&self, without_slug: bool) -> Result<Vec<String>> {
        let mut query = entities::Project::find()
            .select_only()
            .column(project::Column::Id)
            .order_by_asc(project::Column::Id);
        if without_slug {
            query = query.filter(project::Column::Slug.is_null());
        }

        query
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(ControllerError::Database)
    }

    /// Set slugs by project id
    pub async fn set_project_slugs(&self, slugs: &[(String, String)]) -> Result<u64> {
        debug!("Updating {} project slug(s)", slugs.len());

        let txn = self.db.begin().await.map_err(ControllerError::Database)?;
        let mut updated = 0;
        for (id, slug) in slugs {
            updated += entities::Project::update_many()
                .col_expr(project::Column::Slug, Expr::value(slug.clone()))
                .filter(project::Column::Id.eq(id.clone()))
                .exec(&txn)
                .await
                .map_err(ControllerError::Database)?
                .rows_affected;
        }
        txn.commit().await.map_err(ControllerError::Database)?;

        Ok(updated)
    }

    /// Store the snapshot and insert the events in one transaction
    pub async fn save_detection(
        &self,
        project_id: &str,
        result: &DetectionResult,
        events: &[Event],
    ) -> Result<()> {
        debug!(
            "Saving detection for project {} with {} event(s)",
            project_id,
            events.len()
        );

        let txn = self.db.begin().await.map_err(ControllerError::Database)?;

        let updated = entities::Project::update_many()
            .col_expr(
                project::Column::DetectionResult,
                Expr::value(serde_json::to_value(result)?),
            )
            .filter(project::Column::Id.eq(project_id))
            .exec(&txn)
            .await
            .map_err(ControllerError::Database)?
            .rows_affected;
        if updated == 0 {
            return Err(ControllerError::not_found(format!("project {}", project_id)));
        }

        if !events.is_empty() {
            entities::Event::insert_many(events.iter().map(event_active_model))
                .exec_without_returning(&txn)
                .await
                .map_err(ControllerError::Database)?;
        }

        txn.commit().await.map_err(ControllerError::Database)?;
        Ok(())
    }

    /// Delete projects without applications, with their events
    pub async fn delete_orphan_projects(&self) -> Result<u64> {
        let txn = self.db.begin().await.map_err(ControllerError::Database)?;

        let linked: HashSet<String> = entities::App::find()
            .select_only()
            .column(app::Column::ProjectId)
            .filter(app::Column::ProjectId.is_not_null())
            .into_tuple::<Option<String>>()
            .all(&txn)
            .await
            .map_err(ControllerError::Database)?
            .into_iter()
            .flatten()
            .collect();

        let orphans: Vec<String> = entities::Project::find()
            .select_only()
            .column(project::Column::Id)
            .into_tuple::<String>()
            .all(&txn)
            .await
            .map_err(ControllerError::Database)?
            .into_iter()
            .filter(|id| !linked.contains(id))
            .collect();

        if orphans.is_empty() {
            return Ok(0);
        }
        debug!("Deleting {} orphan project(s)", orphans.len());

        entities::Event::delete_many()
            .filter(event::Column::ProjectId.is_in(orphans.clone()))
            .exec(&txn)
            .await
            .map_err(ControllerError::Database)?;

        let deleted = entities::Project::delete_many()
            .filter(project::Column::Id.is_in(orphans))
            .exec(&txn)
            .await
            .map_err(ControllerError::Database)?
            .rows_affected;

        txn.commit().await.map_err(ControllerError::Database)?;
        Ok(deleted)
    }
}
