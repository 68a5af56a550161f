//! Client-facing application endpoints
//!
//! - `GET  /sentry/apps/{reference}/` returns the settings a client should use
//! - `POST /sentry/apps/{reference}/metrics/{metric_name}/` merges a report

use crate::core::metrics::MetricReport;
use crate::server::state::AppState;
use crate::utils::error::ControllerError;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use tracing::debug;

/// Configure application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sentry/apps")
            .route("/{reference}/", web::get().to(lookup))
            .route(
                "/{reference}/metrics/{metric_name}/",
                web::post().to(report_metrics),
            ),
    );
}

/// Current sample rate and metric settings, with the panic override applied
async fn lookup(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ControllerError> {
    let reference = path.into_inner();
    debug!("Lookup for app {}", reference);

    let settings = state.rates.lookup(&reference, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

async fn report_metrics(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<MetricReport>,
) -> Result<HttpResponse, ControllerError> {
    let (reference, metric_name) = path.into_inner();
    debug!("{} report {} for app {}", body.family, metric_name, reference);

    state
        .aggregator
        .ingest(&reference, body.into_inner(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}
