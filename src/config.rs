//! Configuration loader and validator for the analytics client.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `api.token`.
pub const TOKEN_ENV: &str = "PULSEBOARD_API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub api: Api,
    pub dashboard: Dashboard,
    pub reports: Reports,
}

/// Analytics backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Display bounds for the dashboard and report detail views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dashboard {
    pub action_items_limit: usize,
    pub appreciation_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reports {
    pub page_size: u32,
    pub download_dir: String,
}

fn default_user_agent() -> String {
    format!("pulseboard/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Ensure required directories exist (creates `reports.download_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.reports.download_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.reports.download_dir)
    }

    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(&self.reports.download_dir)
    }

    /// Bearer token with blank values treated as absent.
    pub fn token(&self) -> Option<&str> {
        self.api
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.api.token = Some(token);
            }
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - `PULSEBOARD_API_TOKEN` overrides the token from the file.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_env();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let base = cfg.api.base_url.trim();
    if base.is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    match reqwest::Url::parse(base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(ConfigError::Invalid(
                "api.base_url must be an absolute http(s) URL",
            ))
        }
    }
    if cfg.api.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("api.timeout_seconds must be > 0"));
    }

    if cfg.dashboard.action_items_limit == 0 {
        return Err(ConfigError::Invalid("dashboard.action_items_limit must be > 0"));
    }
    if cfg.dashboard.appreciation_limit == 0 {
        return Err(ConfigError::Invalid("dashboard.appreciation_limit must be > 0"));
    }

    if cfg.reports.page_size == 0 {
        return Err(ConfigError::Invalid("reports.page_size must be > 0"));
    }
    if cfg.reports.download_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("reports.download_dir must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the client.
pub fn example() -> &'static str {
    r#"api:
  base_url: "http://localhost:8000/api/v1/"
  token: "YOUR_ACCESS_TOKEN"
  timeout_seconds: 30
  user_agent: "pulseboard/0.1"

dashboard:
  action_items_limit: 5
  appreciation_limit: 3

reports:
  page_size: 20
  download_dir: "./downloads"
"#
}
