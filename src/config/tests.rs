//! Tests for configuration loading

use super::*;
use std::io::Write;

#[test]
fn test_empty_document_yields_defaults() {
    let config = PostfetchConfig::from_toml_str("").unwrap();

    assert_eq!(config, PostfetchConfig::default());
    assert_eq!(config.stages.poll_timeout(), Duration::from_millis(500));
    assert_eq!(config.stages.error_backoff(), Duration::from_millis(500));
    assert!(config.stats.is_none());
}

#[test]
fn test_local_backend_defaults_path() {
    let config = PostfetchConfig::from_toml_str(
        r#"
        [stats]
        backend = "local"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.stats,
        Some(StatsConfig::Local {
            path: PathBuf::from(DEFAULT_STATS_DB_FILE)
        })
    );
}

#[test]
fn test_distributed_backend_with_defaults() {
    let config = PostfetchConfig::from_toml_str(
        r#"
        [stages]
        poll_timeout_ms = 100
        profile = true

        [stats]
        backend = "distributed"
        servers = ["db0.example.org:28015", "db1.example.org"]
        shards = 2
        "#,
    )
    .unwrap();

    assert!(config.stages.profile);
    assert_eq!(config.stages.poll_timeout_ms, 100);
    assert_eq!(
        config.stats,
        Some(StatsConfig::Distributed {
            servers: vec![
                "db0.example.org:28015".to_string(),
                "db1.example.org".to_string()
            ],
            db: DEFAULT_STATS_DB.to_string(),
            table: DEFAULT_STATS_TABLE.to_string(),
            shards: 2,
            replicas: DEFAULT_REPLICAS,
        })
    );
}

#[test]
fn test_distributed_backend_requires_servers() {
    let result = PostfetchConfig::from_toml_str(
        r#"
        [stats]
        backend = "distributed"
        servers = []
        "#,
    );

    match result {
        Err(ConfigError::Invalid { message }) => assert!(message.contains("stats.servers")),
        other => panic!("Expected Invalid error, got {:?}", other),
    }
}

#[test]
fn test_unknown_backend_is_a_parse_error() {
    let result = PostfetchConfig::from_toml_str(
        r#"
        [stats]
        backend = "memcached"
        "#,
    );
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_unknown_logging_format_is_rejected() {
    let result = PostfetchConfig::from_toml_str(
        r#"
        [logging]
        format = "xml"
        "#,
    );
    assert!(matches!(result, Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_load_reports_file_name_on_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[stages]\npoll_timeout_ms = 0").unwrap();

    match PostfetchConfig::load(file.path()) {
        Err(ConfigError::Invalid { message }) => {
            assert!(message.contains(&file.path().display().to_string()));
        }
        other => panic!("Expected Invalid error, got {:?}", other),
    }
}

#[test]
fn test_load_missing_file_is_not_user_actionable() {
    use crate::core::error_handling::ContextualError;

    let dir = tempfile::tempdir().unwrap();
    let err = PostfetchConfig::load(&dir.path().join("missing.toml")).unwrap_err();

    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(!err.is_user_actionable());
    assert_eq!(err.user_message(), None);
}

#[test]
fn test_discover_prefers_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

    let config = PostfetchConfig::discover(Some(file.path())).unwrap();
    assert_eq!(config.logging.level, "debug");
}
