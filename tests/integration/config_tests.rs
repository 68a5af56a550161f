//! Configuration loading tests

#[cfg(test)]
mod tests {
    use sampling_controller::Config;
    use sampling_controller::config::LogFormat;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/controller.yaml.example");
        let config = Config::from_file(&path).await.unwrap();

        assert_eq!(config.detection().lag, 48);
        assert_eq!(config.scheduler().detect_concurrency, 4);
        assert_eq!(config.upstream().stats.outcome, "accepted");
        assert_eq!(config.logging().format, LogFormat::Pretty);
    }

    #[tokio::test]
    async fn test_yaml_round_trip_keeps_values() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"sampling:\n  default_sample_rate: 0.3\nlogging:\n  format: json\n")
            .unwrap();

        let config = Config::from_file(file.path()).await.unwrap();
        assert_eq!(config.sampling().default_sample_rate, 0.3);
        assert_eq!(config.logging().format, LogFormat::Json);

        let mut copy = NamedTempFile::new().unwrap();
        copy.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();
        let reloaded = Config::from_file(copy.path()).await.unwrap();
        assert_eq!(reloaded.sampling().default_sample_rate, 0.3);
        assert_eq!(reloaded.logging().format, LogFormat::Json);
    }

    #[tokio::test]
    async fn test_invalid_detection_params_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"detection:\n  lag: 1\n").unwrap();

        assert!(Config::from_file(file.path()).await.is_err());
    }
}
