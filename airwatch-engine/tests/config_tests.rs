//! Configuration file resolution and graceful degradation
//!
//! Tests that touch AIRWATCH_CONFIG / AIRWATCH_DATABASE are marked #[serial]
//! so they never race each other on the process environment.

use airwatch_engine::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR, DATABASE_ENV_VAR};
use airwatch_engine::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/env-config.toml");
    let resolved = resolve_config_path(Some(Path::new("/tmp/cli-config.toml")));
    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/cli-config.toml")));
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/env-config.toml");
    let resolved = resolve_config_path(None);
    env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/env-config.toml")));
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let config = TomlConfig::load(Some(Path::new("/nonexistent/airwatch/config.toml")))
        .expect("missing config must not be fatal");
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_load_reads_file() {
    let file = write_config(
        r#"
        bind_address = "0.0.0.0"
        port = 9000
        database_path = "/var/lib/airwatch/test.db"

        [logging]
        level = "debug"

        [monitor]
        enabled = false
        cooldown_minutes = 30
        "#,
    );
    let config = TomlConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.port, 9000);
    assert_eq!(config.logging.level, "debug");
    assert!(!config.monitor.enabled);
    assert_eq!(config.monitor.cooldown_minutes, 30);
    assert_eq!(config.monitor.history_limit, 10);
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    let file = write_config("port = [1, 2");
    assert!(matches!(
        TomlConfig::load(Some(file.path())),
        Err(Error::Config(_))
    ));
}

#[test]
#[serial]
fn test_database_path_priority() {
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/tmp/toml.db")),
        ..Default::default()
    };

    env::remove_var(DATABASE_ENV_VAR);
    assert_eq!(config.resolve_database_path(None), PathBuf::from("/tmp/toml.db"));

    env::set_var(DATABASE_ENV_VAR, "/tmp/env.db");
    assert_eq!(config.resolve_database_path(None), PathBuf::from("/tmp/env.db"));
    assert_eq!(
        config.resolve_database_path(Some(Path::new("/tmp/cli.db"))),
        PathBuf::from("/tmp/cli.db")
    );
    env::remove_var(DATABASE_ENV_VAR);

    let bare = TomlConfig::default();
    assert!(bare.resolve_database_path(None).ends_with("airwatch.db"));
}
