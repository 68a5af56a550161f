//! Database integration tests
//!
//! Every case runs against both the migrated in-memory SQLite database and
//! the in-memory store, so the two backends stay interchangeable.

#[cfg(test)]
mod tests {
    use crate::common::{StatsFactory, TestDatabase};
    use chrono::Duration;
    use sampling_controller::ControllerError;
    use sampling_controller::core::detector::{DetectionParams, DetectionResult};
    use sampling_controller::core::metrics::{CounterMap, Counters, MetricFamily};
    use sampling_controller::core::models::{AppDefaults, Event, EventType};
    use sampling_controller::storage::database::DatabaseBackendType;
    use sampling_controller::storage::{MemoryStore, Store};
    use std::sync::Arc;

    async fn backends() -> Vec<(&'static str, Arc<dyn Store>)> {
        vec![
            ("sqlite", TestDatabase::new().await.db_arc() as Arc<dyn Store>),
            ("memory", Arc::new(MemoryStore::new()) as Arc<dyn Store>),
        ]
    }

    fn refs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn dump(signal: Vec<u8>) -> DetectionResult {
        let len = signal.len();
        DetectionResult {
            signal,
            avg_filter: vec![1.0; len],
            std_filter: vec![0.5; len],
            series: vec![2.0; len],
            intervals: StatsFactory::intervals(len),
        }
    }

    #[tokio::test]
    async fn test_database_health_check() {
        let db = TestDatabase::new().await;
        assert!(db.db().health_check().await.is_ok());
        assert_eq!(db.db().backend_type(), DatabaseBackendType::SQLite);
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        for (name, store) in backends().await {
            let params = DetectionParams {
                lag: 12,
                threshold: 4.0,
                influence: 0.5,
            };
            let created = store.get_or_create_project("7", &params).await.unwrap();
            assert_eq!(created.detection_param, params, "{}", name);

            let again = store
                .get_or_create_project("7", &DetectionParams::default())
                .await
                .unwrap();
            assert_eq!(again.detection_param, params, "{}", name);

            store
                .get_or_create_project("8", &DetectionParams::default())
                .await
                .unwrap();
            let mut ids = store.list_project_ids().await.unwrap();
            ids.sort();
            assert_eq!(ids, refs(&["7", "8"]), "{}", name);

            let updated = store
                .update_project_slugs(&[
                    ("7".to_string(), "web".to_string()),
                    ("99".to_string(), "ghost".to_string()),
                ])
                .await
                .unwrap();
            assert_eq!(updated, 1, "{}", name);
            assert_eq!(store.projects_without_slug().await.unwrap(), refs(&["8"]), "{}", name);

            let project = store.get_project("7").await.unwrap().unwrap();
            assert_eq!(project.slug.as_deref(), Some("web"), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_record_detection_and_events() {
        for (name, store) in backends().await {
            store
                .get_or_create_project("1", &DetectionParams::default())
                .await
                .unwrap();

            let events = vec![
                Event::new("1", EventType::Firing, StatsFactory::at(2)),
                Event::new("1", EventType::Discard, StatsFactory::at(3)),
            ];
            store
                .record_detection("1", &dump(vec![0, 0, 1, 0]), &events)
                .await
                .unwrap();

            let project = store.get_project("1").await.unwrap().unwrap();
            assert_eq!(project.detection_result, Some(dump(vec![0, 0, 1, 0])), "{}", name);

            let last = store.last_event("1").await.unwrap().unwrap();
            assert_eq!(last.event_type, EventType::Discard, "{}", name);
            assert_eq!(last.timestamp, StatsFactory::at(3), "{}", name);

            let listed = store.list_events("1").await.unwrap();
            assert_eq!(listed, events, "{}", name);

            let pruned = store.delete_events_before(StatsFactory::at(3)).await.unwrap();
            assert_eq!(pruned, 1, "{}", name);
            assert_eq!(store.list_events("1").await.unwrap().len(), 1, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_record_detection_for_missing_project() {
        for (name, store) in backends().await {
            let err = store
                .record_detection("missing", &dump(vec![0, 1]), &[])
                .await
                .unwrap_err();
            assert!(matches!(err, ControllerError::NotFound(_)), "{}: {:?}", name, err);
        }
    }

    #[tokio::test]
    async fn test_app_defaults_and_counters() {
        for (name, store) in backends().await {
            let defaults = AppDefaults::default();
            let app = store.get_or_create_app("1_prod_web", &defaults).await.unwrap();
            assert_eq!(app.active_sample_rate, defaults.sample_rate, "{}", name);
            assert_eq!(app.wsgi.ignore, defaults.wsgi_ignore_paths, "{}", name);
            assert!(app.last_seen.is_none(), "{}", name);

            let counters: CounterMap =
                serde_json::from_value(serde_json::json!({"path": {"/a": 3}})).unwrap();
            let first = store
                .merge_counters(
                    "1_prod_web",
                    MetricFamily::Wsgi,
                    Counters::Nested(counters.clone()),
                    StatsFactory::at(1),
                )
                .await
                .unwrap();
            assert_eq!(first, counters, "{}", name);
            store
                .set_metric_collection("1_prod_web", MetricFamily::Celery, true)
                .await
                .unwrap();

            let app = store.get_app("1_prod_web").await.unwrap().unwrap();
            assert_eq!(app.wsgi.counters, Some(Counters::Nested(counters.clone())), "{}", name);
            assert_eq!(app.last_seen, Some(StatsFactory::at(1)), "{}", name);

            let second = store
                .merge_counters(
                    "1_prod_web",
                    MetricFamily::Wsgi,
                    Counters::Nested(counters),
                    StatsFactory::at(2),
                )
                .await
                .unwrap();
            assert_eq!(second["path"]["/a"], 6, "{}", name);
            let app = store.get_app("1_prod_web").await.unwrap().unwrap();
            assert_eq!(app.wsgi.counters, Some(Counters::Nested(second)), "{}", name);
            assert_eq!(app.last_seen, Some(StatsFactory::at(2)), "{}", name);

            let err = store
                .merge_counters(
                    "unknown",
                    MetricFamily::Wsgi,
                    Counters::Nested(CounterMap::new()),
                    StatsFactory::at(2),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ControllerError::NotFound(_)), "{}: {:?}", name, err);
            assert!(app.celery.collect, "{}", name);
            assert!(!app.wsgi.collect, "{}", name);

            let err = store
                .touch_app("unknown", StatsFactory::at(1))
                .await
                .unwrap_err();
            assert!(matches!(err, ControllerError::NotFound(_)), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_bump_and_close_windows() {
        for (name, store) in backends().await {
            let defaults = AppDefaults::default();
            for reference in ["a", "b", "c"] {
                store.get_or_create_app(reference, &defaults).await.unwrap();
            }

            let now = StatsFactory::at(0);
            let bumped = store
                .bump_apps(&refs(&["a", "b", "missing"]), 0.9, now + Duration::minutes(5))
                .await
                .unwrap();
            assert_eq!(bumped, 2, "{}", name);

            assert_eq!(store.close_expired_windows(now).await.unwrap(), 0, "{}", name);

            let later = now + Duration::minutes(6);
            assert_eq!(store.close_expired_windows(later).await.unwrap(), 2, "{}", name);

            let app = store.get_app("a").await.unwrap().unwrap();
            assert_eq!(app.active_sample_rate, defaults.sample_rate, "{}", name);
            assert!(app.active_window_end.is_none(), "{}", name);
        }
    }

    #[tokio::test]
    async fn test_link_and_prune() {
        for (name, store) in backends().await {
            let defaults = AppDefaults::default();
            store.get_or_create_app("5_prod_web", &defaults).await.unwrap();
            store.get_or_create_app("legacy", &defaults).await.unwrap();

            let mut unlinked = store.apps_without_project().await.unwrap();
            unlinked.sort();
            assert_eq!(unlinked, refs(&["5_prod_web", "legacy"]), "{}", name);

            store
                .get_or_create_project("5", &DetectionParams::default())
                .await
                .unwrap();
            store
                .get_or_create_project("6", &DetectionParams::default())
                .await
                .unwrap();
            store.link_app("5_prod_web", "5", "prod", "web").await.unwrap();
            store
                .record_detection(
                    "6",
                    &dump(vec![0, 1]),
                    &[Event::new("6", EventType::Firing, StatsFactory::at(1))],
                )
                .await
                .unwrap();

            let app = store.get_app("5_prod_web").await.unwrap().unwrap();
            assert_eq!(app.project_id.as_deref(), Some("5"), "{}", name);
            assert_eq!(app.env.as_deref(), Some("prod"), "{}", name);
            assert_eq!(app.command.as_deref(), Some("web"), "{}", name);
            assert_eq!(store.apps_without_project().await.unwrap(), refs(&["legacy"]), "{}", name);

            assert_eq!(store.delete_projects_without_apps().await.unwrap(), 1, "{}", name);
            assert!(store.get_project("6").await.unwrap().is_none(), "{}", name);
            assert!(store.list_events("6").await.unwrap().is_empty(), "{}", name);

            store.touch_app("5_prod_web", StatsFactory::at(0)).await.unwrap();
            store.touch_app("legacy", StatsFactory::at(10)).await.unwrap();
            let pruned = store
                .delete_apps_inactive_since(StatsFactory::at(5))
                .await
                .unwrap();
            assert_eq!(pruned, 1, "{}", name);
            assert!(store.get_app("5_prod_web").await.unwrap().is_none(), "{}", name);
        }
    }
}
