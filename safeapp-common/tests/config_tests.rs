//! Configuration loading and graceful degradation
//!
//! Tests that manipulate SAFEAPP_CONFIG or SAFEAPP_N8N_URL are marked
//! #[serial] so they never race each other.

use safeapp_common::config::{
    resolve_config_path, ConfigSource, DashConfig, BASE_URL_ENV_VAR, CONFIG_ENV_VAR,
};
use safeapp_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    env::remove_var(BASE_URL_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let config = DashConfig::load(Some(&missing)).unwrap();

    assert_eq!(config, DashConfig::default());
}

#[test]
#[serial]
fn test_load_reports_missing_file_for_later_logging() {
    // Given: a config path with nothing behind it
    env::remove_var(BASE_URL_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    // When
    let (config, report) = DashConfig::load_with_report(Some(&missing)).unwrap();

    // Then: defaults, and the missing path is kept for the startup warning
    assert_eq!(config, DashConfig::default());
    assert_eq!(report.source, ConfigSource::Missing(missing));
    assert!(!report.base_url_from_env);

    // And an existing file plus an override are both reported
    let path = dir.path().join("config.toml");
    fs::write(&path, "base_url = \"http://file.local\"\n").unwrap();
    env::set_var(BASE_URL_ENV_VAR, "http://override.local");
    let (_, report) = DashConfig::load_with_report(Some(&path)).unwrap();
    env::remove_var(BASE_URL_ENV_VAR);

    assert_eq!(report.source, ConfigSource::File(path));
    assert!(report.base_url_from_env);
}

#[test]
#[serial]
fn test_cli_path_wins_over_env() {
    env::remove_var(BASE_URL_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let cli = dir.path().join("cli.toml");
    let from_env = dir.path().join("env.toml");
    fs::write(&cli, "base_url = \"http://cli.local\"\n").unwrap();
    fs::write(&from_env, "base_url = \"http://env.local\"\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &from_env);

    let config = DashConfig::load(Some(&cli)).unwrap();
    assert_eq!(config.base_url, "http://cli.local");

    let config = DashConfig::load(None).unwrap();
    assert_eq!(config.base_url, "http://env.local");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_base_url_env_override() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "base_url = \"http://file.local\"\nrequest_timeout_secs = 5\n").unwrap();
    env::set_var(BASE_URL_ENV_VAR, "http://override.local");

    let config = DashConfig::load(Some(&path)).unwrap();

    env::remove_var(BASE_URL_ENV_VAR);
    assert_eq!(config.base_url, "http://override.local");
    assert_eq!(config.request_timeout_secs, 5);
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    env::remove_var(BASE_URL_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "base_url = [not toml").unwrap();

    let result = DashConfig::load(Some(&path));

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_resolve_prefers_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved.unwrap(), Path::new("/tmp/from-cli.toml"));
}

#[test]
fn test_logging_section_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[logging]\nlevel = \"debug\"\nfile = \"/var/log/safeapp.log\"\n",
    )
    .unwrap();

    let config = DashConfig::from_file(&path).unwrap();

    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.logging.file.as_deref(),
        Some(Path::new("/var/log/safeapp.log"))
    );
}
