//! Configuration loading for the dashboard
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `SAFEAPP_CONFIG` environment variable
//! 3. `<config dir>/safeapp/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file is never fatal: we warn and run on defaults. A file that
//! exists but does not parse is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SAFEAPP_CONFIG";
/// Environment variable overriding `base_url`
pub const BASE_URL_ENV_VAR: &str = "SAFEAPP_N8N_URL";

const DEFAULT_BASE_URL: &str = "https://n8n.superprojetx.com";
const DEFAULT_RECIPIENT: &str = "contact@safehdf.com";

/// Dashboard configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashConfig {
    /// Workflow automation host; webhooks live under `{base_url}/webhook/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Address record notifications are sent to
    #[serde(default = "default_recipient")]
    pub notification_recipient: String,

    #[serde(default)]
    pub webhooks: WebhookPaths,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Webhook path per remote operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookPaths {
    pub list_tasks: String,
    pub create_task: String,
    pub update_task: String,
    pub delete_task: String,
    pub list_calendar: String,
    pub list_stock: String,
    pub update_stock: String,
    pub list_fiches: String,
    pub upload_asset: String,
    pub upsert_fiche: String,
    pub delete_fiche: String,
    pub notify: String,
    pub transcribe: String,
}

impl Default for WebhookPaths {
    fn default() -> Self {
        Self {
            list_tasks: "safeapp-tasks".to_string(),
            create_task: "safeapp-task-create".to_string(),
            update_task: "safeapp-task-update".to_string(),
            delete_task: "safeapp-task-delete".to_string(),
            list_calendar: "safeapp-calendar".to_string(),
            list_stock: "safeapp-stock".to_string(),
            update_stock: "safeapp-stock-update".to_string(),
            list_fiches: "safeapp-fiches".to_string(),
            upload_asset: "safeapp-fiche-asset".to_string(),
            upsert_fiche: "safeapp-fiche-upsert".to_string(),
            delete_fiche: "safeapp-fiche-delete".to_string(),
            notify: "safeapp-send-email".to_string(),
            transcribe: "safeapp-transcribe".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_recipient() -> String {
    DEFAULT_RECIPIENT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
            notification_recipient: default_recipient(),
            webhooks: WebhookPaths::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DashConfig {
    /// Resolve the config file, load it, then apply environment overrides
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let (config, report) = Self::load_with_report(cli_path)?;
        report.log();
        Ok(config)
    }

    /// Same as `load`, but leaves logging to the caller.
    ///
    /// The binary loads its config before a subscriber exists, so it logs the
    /// report once tracing is initialized.
    pub fn load_with_report(cli_path: Option<&Path>) -> Result<(Self, LoadReport)> {
        let (mut config, source) = match resolve_config_path(cli_path) {
            Some(path) if path.exists() => (Self::from_file(&path)?, ConfigSource::File(path)),
            Some(path) => (Self::default(), ConfigSource::Missing(path)),
            None => (Self::default(), ConfigSource::Defaults),
        };
        let base_url_from_env = config.apply_env_overrides();
        config.validate()?;
        Ok((
            config,
            LoadReport {
                source,
                base_url_from_env,
            },
        ))
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    fn apply_env_overrides(&mut self) -> bool {
        match std::env::var(BASE_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => {
                self.base_url = url.trim().to_string();
                true
            }
            _ => false,
        }
    }

    /// Reject values no client could run with
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of a webhook path
    pub fn webhook_url(&self, path: &str) -> String {
        format!(
            "{}/webhook/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Resolved location had no file; defaults used
    Missing(PathBuf),
    /// No location could be resolved at all
    Defaults,
}

/// Outcome of `DashConfig::load_with_report`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: ConfigSource,
    pub base_url_from_env: bool,
}

impl LoadReport {
    pub fn log(&self) {
        match &self.source {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigSource::Defaults => {
                warn!("No config file location available, using built-in defaults")
            }
        }
        if self.base_url_from_env {
            info!("Webhook base URL overridden by {}", BASE_URL_ENV_VAR);
        }
    }
}

/// Pick the config file location: CLI argument, then environment, then the
/// per-user config directory.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("safeapp").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url_joins_cleanly() {
        let config = DashConfig {
            base_url: "http://localhost:5678/".to_string(),
            ..DashConfig::default()
        };
        assert_eq!(
            config.webhook_url("/safeapp-stock"),
            "http://localhost:5678/webhook/safeapp-stock"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DashConfig {
            base_url: "ftp://example".to_string(),
            ..DashConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = DashConfig {
            request_timeout_secs: 0,
            ..DashConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(DashConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DashConfig = toml::from_str(
            r#"
            base_url = "http://n8n.local"

            [webhooks]
            list_stock = "stock-v2"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://n8n.local");
        assert_eq!(config.webhooks.list_stock, "stock-v2");
        assert_eq!(config.webhooks.list_tasks, "safeapp-tasks");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }
}
