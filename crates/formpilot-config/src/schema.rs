//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.port".to_string(),
                message: "must be non-zero".to_string(),
            });
        }
        if self.browser.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "browser.host".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Browser debugging endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl BrowserConfig {
    /// Base URL of the browser's HTTP debugging endpoint.
    pub fn http_base(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9222
}

/// Page controller behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Keep driving the tab the controller first attached to, even when
    /// focus moves elsewhere.
    #[serde(default = "default_true")]
    pub force_same_tab_navigation: bool,

    /// Show the visual feedback overlay on controlled pages.
    #[serde(default = "default_true")]
    pub overlay: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            force_same_tab_navigation: true,
            overlay: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.browser.host, "127.0.0.1");
        assert_eq!(config.browser.port, 9222);
        assert!(config.controller.force_same_tab_navigation);
        assert!(config.controller.overlay);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_http_base() {
        let browser = BrowserConfig {
            host: "localhost".to_string(),
            port: 9333,
        };
        assert_eq!(browser.http_base(), "http://localhost:9333");
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = Config::default();
        config.browser.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_host() {
        let mut config = Config::default();
        config.browser.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }
}
