use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

const BASE_URL_ENV:     &str = "STUDYLOG_API_BASE_URL";
const CORS_ORIGINS_ENV: &str = "CORS_ORIGINS";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api:  ApiConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_timeout() -> u64 { 30 }
fn default_callback_port() -> u16 { 8085 }

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: None, timeout_seconds: default_timeout() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Local port the OAuth callback listener binds to.
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { callback_port: default_callback_port() }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = config_dir().join("config.toml");
        let mut cfg = if path.exists() {
            Self::from_toml(&std::fs::read_to_string(&path)?)?
        } else {
            AppConfig::default()
        };
        cfg.apply_env(
            std::env::var(BASE_URL_ENV).ok(),
            std::env::var(CORS_ORIGINS_ENV).ok(),
        );
        Ok(cfg)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn apply_env(&mut self, base_url: Option<String>, cors_origins: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = Some(url);
        }
        if let Some(list) = cors_origins {
            self.cors.origins = split_origins(&list);
        }
    }
}

/// Comma separated list, trimmed, empty entries dropped.
pub fn split_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studylog")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studylog")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert!(cfg.api.base_url.is_none());
        assert_eq!(cfg.api.timeout_seconds, 30);
        assert_eq!(cfg.auth.callback_port, 8085);
        assert!(cfg.cors.origins.is_empty());
    }

    #[test]
    fn reads_sections() {
        let cfg = AppConfig::from_toml(
            "[api]\nbase_url = \"https://api.example.com\"\n\
             [cors]\norigins = [\"https://app.example.com\"]\n\
             [auth]\ncallback_port = 9000\n",
        ).unwrap();
        assert_eq!(cfg.api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(cfg.cors.origins, vec!["https://app.example.com"]);
        assert_eq!(cfg.auth.callback_port, 9000);
    }

    #[test]
    fn env_overrides_file() {
        let mut cfg = AppConfig::from_toml("[api]\nbase_url = \"https://old\"\n").unwrap();
        cfg.apply_env(Some("https://new".into()), Some(" https://a.io , ,https://b.io".into()));
        assert_eq!(cfg.api.base_url.as_deref(), Some("https://new"));
        assert_eq!(cfg.cors.origins, vec!["https://a.io", "https://b.io"]);

        cfg.apply_env(Some("  ".into()), None);
        assert_eq!(cfg.api.base_url.as_deref(), Some("https://new"));
    }
}
