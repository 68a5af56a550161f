//! Sample rate controller tests: bumps, panic override and lookups

#[cfg(test)]
mod tests {
    use crate::common::TestController;
    use chrono::{Duration, Utc};
    use sampling_controller::ControllerError;
    use sampling_controller::core::metrics::MetricFamily;
    use sampling_controller::core::sampling::BumpRequest;

    fn refs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_lookup_creates_app_with_defaults() {
        let ctl = TestController::new();
        let now = Utc::now();

        let settings = ctl.controller.rates().lookup("1_prod_web", now).await.unwrap();
        assert_eq!(settings.reference, "1_prod_web");
        assert_eq!(settings.active_sample_rate, 0.1);
        assert!(settings.active_window_end.is_none());
        assert!(settings.wsgi_ignore_path.contains(&"/health".to_string()));

        let app = ctl.store.get_app("1_prod_web").await.unwrap().unwrap();
        assert_eq!(app.last_seen, Some(now));
    }

    #[tokio::test]
    async fn test_bump_then_lapse() {
        let ctl = TestController::new();
        let rates = ctl.controller.rates();
        let now = Utc::now();
        rates.lookup("a", now).await.unwrap();

        let updated = rates
            .bump(&refs(&["a"]), BumpRequest::new(0.8, Duration::minutes(10)), now)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let during = rates.lookup("a", now + Duration::minutes(5)).await.unwrap();
        assert_eq!(during.active_sample_rate, 0.8);
        assert_eq!(during.active_window_end, Some(now + Duration::minutes(10)));

        let after = rates.lookup("a", now + Duration::minutes(11)).await.unwrap();
        assert_eq!(after.active_sample_rate, 0.1);
        assert!(after.active_window_end.is_none());

        let closed = rates
            .close_expired_windows(now + Duration::minutes(11))
            .await
            .unwrap();
        assert_eq!(closed, 1);
        assert_eq!(ctl.controller.state().metrics.snapshot().windows_closed, 1);
    }

    #[tokio::test]
    async fn test_bump_rejections() {
        let ctl = TestController::new();
        let rates = ctl.controller.rates();
        let now = Utc::now();
        rates.lookup("a", now).await.unwrap();

        let too_long = BumpRequest::new(0.5, Duration::hours(2));
        let err = rates.bump(&refs(&["a"]), too_long, now).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));

        let bad_rate = BumpRequest::new(1.5, Duration::minutes(1));
        let err = rates.bump(&refs(&["a"]), bad_rate, now).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));

        let ok = BumpRequest::new(0.5, Duration::minutes(1));
        let err = rates.bump(&[], ok, now).await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));

        let err = rates.bump(&refs(&["nobody"]), ok, now).await.unwrap_err();
        assert!(matches!(err, ControllerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_panic_overrides_every_rate() {
        let ctl = TestController::new();
        let rates = ctl.controller.rates();
        let now = Utc::now();
        rates.lookup("a", now).await.unwrap();
        rates
            .bump(&refs(&["a"]), BumpRequest::new(1.0, Duration::minutes(5)), now)
            .await
            .unwrap();

        rates.panic().await.unwrap();
        assert!(rates.is_panic().await.unwrap());
        assert_eq!(rates.lookup("a", now).await.unwrap().active_sample_rate, 0.0);
        assert_eq!(rates.lookup("b", now).await.unwrap().active_sample_rate, 0.0);

        let err = rates
            .bump(&refs(&["a"]), BumpRequest::new(0.5, Duration::minutes(1)), now)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Conflict(_)));
        assert!(matches!(rates.panic().await.unwrap_err(), ControllerError::Conflict(_)));

        rates.unpanic().await.unwrap();
        assert_eq!(rates.lookup("a", now).await.unwrap().active_sample_rate, 1.0);
        assert!(matches!(rates.unpanic().await.unwrap_err(), ControllerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_metric_collection_toggle() {
        let ctl = TestController::new();
        let rates = ctl.controller.rates();
        let now = Utc::now();
        rates.lookup("a", now).await.unwrap();

        rates
            .set_metric_collection(&refs(&["a"]), &[MetricFamily::Celery])
            .await
            .unwrap();
        let settings = rates.lookup("a", now).await.unwrap();
        assert!(settings.celery_collect_metrics);
        assert!(!settings.wsgi_collect_metrics);

        let err = rates
            .set_metric_collection(&refs(&["a", "ghost"]), &[MetricFamily::Wsgi])
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::NotFound(_)));
        assert!(!rates.lookup("a", now).await.unwrap().wsgi_collect_metrics);
    }
}
