use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::eyre;
use serde::Deserialize;

use crate::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// The inventory REST API.
    Http {
        /// Base url the `/devices` routes hang off
        base_url: String,
        /// Per-request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        /// Bearer token attached to every request
        #[serde(default)]
        token: Option<String>,
    },
    /// A seeded in-process inventory, for demos.
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct ConsoleConfig {
    /// Rows per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Quiet period before a search is committed, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Interval between automatic reloads, in seconds
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    350
}

fn default_refresh_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Http {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

/// Timing and paging knobs of a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub page_size: usize,
    pub debounce: Duration,
    pub refresh_interval: Duration,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        ConsoleConfig::default().settings()
    }
}

impl ConsoleConfig {
    pub fn settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
            refresh_interval: Duration::from_secs(self.refresh_secs),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> color_eyre::Result<()> {
        if self.console.page_size == 0 {
            return Err(eyre!("console.page_size must be at least 1"));
        }
        if self.console.refresh_secs == 0 {
            return Err(eyre!("console.refresh_secs must be at least 1"));
        }
        if let BackendConfig::Http { timeout_secs: 0, .. } = self.backend {
            return Err(eyre!("backend.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_http_backend_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            type = "http"
            base_url = "https://inventory.example.com/api"

            [console]
            page_size = 50
            "#,
        )
        .unwrap();

        match &config.backend {
            BackendConfig::Http {
                base_url,
                timeout_secs,
                token,
            } => {
                assert_eq!(base_url, "https://inventory.example.com/api");
                assert_eq!(*timeout_secs, 10);
                assert!(token.is_none());
            }
            other => panic!("unexpected backend: {other:?}"),
        }

        let settings = config.console.settings();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.debounce, Duration::from_millis(350));
        assert_eq!(settings.refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn parses_memory_backend() {
        let config: Config = toml::from_str("[backend]\ntype = \"memory\"\n").unwrap();
        assert!(matches!(config.backend, BackendConfig::Memory));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_page_size() {
        let config: Config = toml::from_str("[console]\npage_size = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
