//! HTTP route tests

#[cfg(test)]
mod tests {
    use crate::common::TestController;
    use actix_web::{http::StatusCode, test, web};
    use sampling_controller::core::metrics::{CounterMap, Counters};
    use sampling_controller::core::sampling::AppSettings;
    use sampling_controller::server::HttpServer;
    use serde_json::json;

    #[actix_web::test]
    async fn test_lookup_creates_app() {
        let ctl = TestController::new();
        let app = test::init_service(HttpServer::create_app(web::Data::new(
            ctl.controller.state().clone(),
        )))
        .await;

        let req = test::TestRequest::get()
            .uri("/sentry/apps/3_prod_web/")
            .to_request();
        let settings: AppSettings = test::call_and_read_body_json(&app, req).await;

        assert_eq!(settings.reference, "3_prod_web");
        assert_eq!(settings.active_sample_rate, 0.1);
        assert!(ctl.store.get_app("3_prod_web").await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn test_lookup_during_panic() {
        let ctl = TestController::new();
        ctl.controller.rates().panic().await.unwrap();
        let app = test::init_service(HttpServer::create_app(web::Data::new(
            ctl.controller.state().clone(),
        )))
        .await;

        let req = test::TestRequest::get().uri("/sentry/apps/web/").to_request();
        let settings: AppSettings = test::call_and_read_body_json(&app, req).await;
        assert_eq!(settings.active_sample_rate, 0.0);
    }

    #[actix_web::test]
    async fn test_reports_are_merged() {
        let ctl = TestController::new();
        let app = test::init_service(HttpServer::create_app(web::Data::new(
            ctl.controller.state().clone(),
        )))
        .await;

        for body in [
            json!({"type": "WSGI", "data": {"path": {"/a": 1, "/b": 2}}}),
            json!({"type": "WSGI", "data": {"path": {"/b": 3}, "status": {"500": 1}}}),
        ] {
            let req = test::TestRequest::post()
                .uri("/sentry/apps/web/metrics/requests/")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let stored = ctl.store.get_app("web").await.unwrap().unwrap();
        let expected: CounterMap = serde_json::from_value(json!({
            "path": {"/a": 1, "/b": 5},
            "status": {"500": 1}
        }))
        .unwrap();
        assert_eq!(stored.wsgi.counters, Some(Counters::Nested(expected)));
        assert!(stored.last_seen.is_some());
        assert_eq!(ctl.controller.state().metrics.snapshot().reports_merged, 2);
    }

    #[actix_web::test]
    async fn test_unknown_metric_type_is_rejected() {
        let ctl = TestController::new();
        let app = test::init_service(HttpServer::create_app(web::Data::new(
            ctl.controller.state().clone(),
        )))
        .await;

        let req = test::TestRequest::post()
            .uri("/sentry/apps/web/metrics/requests/")
            .set_json(json!({"type": "KAFKA", "data": {}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(ctl.store.get_app("web").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_health_and_metrics() {
        let ctl = TestController::new();
        let app = test::init_service(HttpServer::create_app(web::Data::new(
            ctl.controller.state().clone(),
        )))
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["panic"], false);

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("sampling_controller_reports_merged_total 0"));
    }
}
