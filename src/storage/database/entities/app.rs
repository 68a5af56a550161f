use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Application database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "apps")]
pub struct Model {
    /// External reference, `projectId_env_command` when linkable
    #[sea_orm(primary_key, auto_increment = false)]
    pub reference: String,

    pub last_seen: Option<DateTimeUtc>,

    pub default_sample_rate: f64,

    pub active_sample_rate: f64,

    /// End of the current bump window
    pub active_window_end: Option<DateTimeUtc>,

    /// Owning project, set by `populate_app`
    pub project_id: Option<String>,

    pub env: Option<String>,

    pub command: Option<String>,

    pub wsgi_collect_metrics: bool,

    /// Request-serving totals
    pub wsgi_metrics: Option<Json>,

    /// Paths the client should not report
    pub wsgi_ignore_path: Json,

    pub celery_collect_metrics: bool,

    /// Worker totals
    pub celery_metrics: Option<Json>,

    /// Tasks the client should not report
    pub celery_ignore_task: Json,
}

/// Application entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Belongs to project relation
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
