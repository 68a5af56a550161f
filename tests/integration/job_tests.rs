//! Scheduled job tests

#[cfg(test)]
mod tests {
    use crate::common::{StatsFactory, TestController, test_config};
    use chrono::{Duration, Utc};
    use sampling_controller::core::detector::{DetectionParams, DetectionResult};
    use sampling_controller::core::models::{AppDefaults, Event, EventType};
    use sampling_controller::core::sampling::BumpRequest;
    use sampling_controller::ControllerError;
    use sampling_controller::services::Job;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_populate_app_links_encoded_references() {
        let ctl = TestController::new();
        let defaults = AppDefaults::default();
        for reference in ["12_prod_web", "12_staging_worker", "standalone", "a_b_c_d"] {
            ctl.store.get_or_create_app(reference, &defaults).await.unwrap();
        }

        let linked = ctl.controller.jobs().populate_app().await.unwrap();
        assert_eq!(linked, 2);

        let project = ctl.store.get_project("12").await.unwrap().unwrap();
        assert_eq!(project.detection_param, DetectionParams::default());

        let app = ctl.store.get_app("12_staging_worker").await.unwrap().unwrap();
        assert_eq!(app.env.as_deref(), Some("staging"));
        assert_eq!(app.command.as_deref(), Some("worker"));

        let mut unlinked = ctl.store.apps_without_project().await.unwrap();
        unlinked.sort();
        assert_eq!(unlinked, vec!["a_b_c_d".to_string(), "standalone".to_string()]);

        assert_eq!(ctl.controller.jobs().populate_app().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prune_inactive_app_drops_empty_projects() {
        let ctl = TestController::new();
        let jobs = ctl.controller.jobs();
        let now = Utc::now();
        let defaults = AppDefaults::default();

        ctl.store.get_or_create_app("1_prod_web", &defaults).await.unwrap();
        ctl.store.get_or_create_app("2_prod_web", &defaults).await.unwrap();
        jobs.populate_app().await.unwrap();

        ctl.store
            .touch_app("1_prod_web", now - Duration::days(8))
            .await
            .unwrap();
        ctl.store
            .touch_app("2_prod_web", now - Duration::days(1))
            .await
            .unwrap();

        let (apps, projects) = jobs.prune_inactive_app(now).await.unwrap();
        assert_eq!((apps, projects), (1, 1));
        assert!(ctl.store.get_project("1").await.unwrap().is_none());
        assert!(ctl.store.get_project("2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_prune_old_event() {
        let ctl = TestController::new();
        let now = Utc::now();
        ctl.store
            .get_or_create_project("1", &DetectionParams::default())
            .await
            .unwrap();
        let events = vec![
            Event::new("1", EventType::Firing, now - Duration::days(40)),
            Event::new("1", EventType::Discard, now - Duration::days(2)),
        ];
        let dump = DetectionResult {
            signal: vec![],
            avg_filter: vec![],
            std_filter: vec![],
            series: vec![],
            intervals: vec![],
        };
        ctl.store.record_detection("1", &dump, &events).await.unwrap();

        let pruned = ctl.controller.jobs().prune_old_event(now).await.unwrap();
        assert_eq!(pruned, 1);

        let left = ctl.store.list_events("1").await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].event_type, EventType::Discard);
    }

    #[tokio::test]
    async fn test_prune_rejects_unrepresentable_retention() {
        let mut config = test_config("http://127.0.0.1:9/api/0/");
        config.controller.retention.app_max_age_days = i64::MAX;
        config.controller.retention.event_max_age_days = i64::MAX;
        let ctl = TestController::with_config(config);
        let jobs = ctl.controller.jobs();

        let err = jobs.prune_inactive_app(Utc::now()).await.unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)), "{:?}", err);
        let err = jobs.prune_old_event(Utc::now()).await.unwrap_err();
        assert!(matches!(err, ControllerError::Config(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_close_window_job() {
        let ctl = TestController::new();
        let rates = ctl.controller.rates();
        let past = Utc::now() - Duration::hours(1);
        rates.lookup("a", past).await.unwrap();
        rates
            .bump(
                &["a".to_string()],
                BumpRequest::new(0.7, Duration::minutes(5)),
                past,
            )
            .await
            .unwrap();

        ctl.controller.jobs().run(Job::CloseWindow).await.unwrap();

        let app = ctl.store.get_app("a").await.unwrap().unwrap();
        assert_eq!(app.active_sample_rate, app.default_sample_rate);
        assert!(app.active_window_end.is_none());
    }

    #[tokio::test]
    async fn test_pull_project_slug_stops_when_all_found() {
        let server = MockServer::start().await;
        let next = format!("{}/api/0/projects/?cursor=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .and(query_param("cursor", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .with_priority(1)
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([
                        {"id": "1", "slug": "api"},
                        {"id": "2", "slug": "web"},
                        {"id": "3", "slug": "unrelated"}
                    ]))
                    .insert_header("link", format!("<{}>; rel=\"next\"; results=\"true\"", next)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctl = TestController::with_config(test_config(&format!("{}/api/0/", server.uri())));
        for id in ["1", "2"] {
            ctl.store
                .get_or_create_project(id, &DetectionParams::default())
                .await
                .unwrap();
        }

        let updated = ctl.controller.jobs().pull_project_slug().await.unwrap();
        assert_eq!(updated, 2);
        assert!(ctl.store.projects_without_slug().await.unwrap().is_empty());
        assert!(ctl.store.get_project("3").await.unwrap().is_none());

        assert_eq!(ctl.controller.jobs().pull_project_slug().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_monitor_usage_runs_every_project() {
        let server = MockServer::start().await;
        let series = [10.0, 12.0, 11.0, 10.0, 500.0, 11.0, 12.0];
        Mock::given(method("GET"))
            .and(path("/api/0/organizations/acme/stats_v2/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(StatsFactory::accepted(&series)))
            .mount(&server)
            .await;

        let ctl = TestController::with_config(test_config(&format!("{}/api/0/", server.uri())));
        let params = DetectionParams {
            lag: 3,
            threshold: 3.0,
            influence: 0.0,
        };
        for id in ["1", "2", "3"] {
            ctl.store.get_or_create_project(id, &params).await.unwrap();
        }

        let summary = ctl.controller.jobs().monitor_usage().await.unwrap();
        assert_eq!(summary.projects, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.events, 6);
    }
}
