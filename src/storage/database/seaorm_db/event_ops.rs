use crate::core::models::Event;
use crate::utils::error::{ControllerError, Result};
use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::debug;

use super::super::entities::{self, event};
use super::types::SeaOrmDatabase;

impl SeaOrmDatabase {
    /// Latest event of a project
    pub async fn latest_event(&self, project_id: &str) -> Result<Option<Event>> {
        entities::Event::find()
            .filter(event::Column::ProjectId.eq(project_id))
            .order_by_desc(event::Column::Timestamp)
            .one(&self.db)
            .await
            .map_err(ControllerError::Database)?
            .map(Event::try_from)
            .transpose()
    }

    /// Events of a project in timestamp order
    pub async fn project_events(&self, project_id: &str) -> Result<Vec<Event>> {
        entities::Event::find()
            .filter(event::Column::ProjectId.eq(project_id))
            .order_by_asc(event::Column::Timestamp)
            .all(&self.db)
            .await
            .map_err(ControllerError::Database)?
            .into_iter()
            .map(Event::try_from)
            .collect()
    }

    /// Delete events older than `cutoff`
    pub async fn delete_old_events(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        debug!("Deleting events before {}", cutoff);

        let result = entities::Event::delete_many()
            .filter(event::Column::Timestamp.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(ControllerError::Database)?;

        Ok(result.rows_affected)
    }
}
