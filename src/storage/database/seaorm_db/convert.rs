//! Row to domain conversions

use crate::core::metrics::Counters;
use crate::core::models::{Application, Event, EventType, MetricSettings, Project};
use crate::utils::error::{ControllerError, Result};
use sea_orm::Set;
use serde_json::Value;

use super::super::entities::{app, event, project};

fn counters(value: Option<Value>) -> Result<Option<Counters>> {
    Ok(value.map(serde_json::from_value).transpose()?)
}

impl TryFrom<project::Model> for Project {
    type Error = ControllerError;

    fn try_from(model: project::Model) -> Result<Self> {
        Ok(Self {
            id: model.id,
            slug: model.slug,
            detection_param: serde_json::from_value(model.detection_param)?,
            detection_result: model
                .detection_result
                .map(serde_json::from_value)
                .transpose()?,
        })
    }
}

impl TryFrom<app::Model> for Application {
    type Error = ControllerError;

    fn try_from(model: app::Model) -> Result<Self> {
        Ok(Self {
            reference: model.reference,
            last_seen: model.last_seen,
            default_sample_rate: model.default_sample_rate,
            active_sample_rate: model.active_sample_rate,
            active_window_end: model.active_window_end,
            project_id: model.project_id,
            env: model.env,
            command: model.command,
            wsgi: MetricSettings {
                collect: model.wsgi_collect_metrics,
                counters: counters(model.wsgi_metrics)?,
                ignore: serde_json::from_value(model.wsgi_ignore_path)?,
            },
            celery: MetricSettings {
                collect: model.celery_collect_metrics,
                counters: counters(model.celery_metrics)?,
                ignore: serde_json::from_value(model.celery_ignore_task)?,
            },
        })
    }
}

impl TryFrom<event::Model> for Event {
    type Error = ControllerError;

    fn try_from(model: event::Model) -> Result<Self> {
        let event_type: EventType = model.event_type.parse().map_err(ControllerError::Parsing)?;
        Ok(Self {
            id: model.id,
            project_id: model.project_id,
            event_type,
            timestamp: model.timestamp,
        })
    }
}

pub(super) fn app_active_model(app: &Application) -> Result<app::ActiveModel> {
    let json = |c: &Option<Counters>| c.as_ref().map(serde_json::to_value).transpose();
    Ok(app::ActiveModel {
        reference: Set(app.reference.clone()),
        last_seen: Set(app.last_seen),
        default_sample_rate: Set(app.default_sample_rate),
        active_sample_rate: Set(app.active_sample_rate),
        active_window_end: Set(app.active_window_end),
        project_id: Set(app.project_id.clone()),
        env: Set(app.env.clone()),
        command: Set(app.command.clone()),
        wsgi_collect_metrics: Set(app.wsgi.collect),
        wsgi_metrics: Set(json(&app.wsgi.counters)?),
        wsgi_ignore_path: Set(serde_json::to_value(&app.wsgi.ignore)?),
        celery_collect_metrics: Set(app.celery.collect),
        celery_metrics: Set(json(&app.celery.counters)?),
        celery_ignore_task: Set(serde_json::to_value(&app.celery.ignore)?),
    })
}

pub(super) fn event_active_model(event: &Event) -> event::ActiveModel {
    event::ActiveModel {
        id: Set(event.id),
        project_id: Set(event.project_id.clone()),
        event_type: Set(event.event_type.as_str().to_string()),
        timestamp: Set(event.timestamp),
    }
}
