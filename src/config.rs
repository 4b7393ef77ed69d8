use crate::model::Selection;
use chrono::Duration;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend_base: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_true")]
    pub check_version: bool,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub admin: Option<AdminCredentials>,
    /// Applied on top of the restored selection at startup.
    #[serde(default)]
    pub selection: Option<Selection>,
}

fn default_database_path() -> String {
    "configurator.db".to_string()
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

impl AppConfig {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(content)?;
        let base = config.backend_base.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend_base must be an http(s) URL, got {:?}",
                config.backend_base
            )));
        }
        Ok(config)
    }

    /// Backend origin without a trailing slash.
    pub fn backend_origin(&self) -> &str {
        self.backend_base.trim().trim_end_matches('/')
    }

    pub fn api_base(&self) -> String {
        format!("{}/api", self.backend_origin())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::seconds(self.cache_ttl_seconds as i64)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_seconds)
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    AppConfig::from_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let config = AppConfig::from_json(r#"{"backend_base": "https://shop.example/"}"#).unwrap();
        assert_eq!(config.backend_origin(), "https://shop.example");
        assert_eq!(config.api_base(), "https://shop.example/api");
        assert_eq!(config.database_path, "configurator.db");
        assert_eq!(config.cache_ttl(), Duration::hours(24));
        assert!(config.check_version);
        assert!(config.admin.is_none());
    }

    #[test]
    fn rejects_non_http_base() {
        let err = AppConfig::from_json(r#"{"backend_base": "shop.example"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reads_selection_and_admin() {
        let config = AppConfig::from_json(
            r#"{
                "backend_base": "http://localhost:8000",
                "admin": {"username": "admin", "password": "secret"},
                "selection": {"machine": "Rio", "frame_color": "black"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.admin.unwrap().username, "admin");
        let sel = config.selection.unwrap();
        assert_eq!(sel.machine, "Rio");
        assert_eq!(sel.insert_color, "");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(load_config("/nonexistent/config.json"), Err(ConfigError::Io(_))));
    }
}
