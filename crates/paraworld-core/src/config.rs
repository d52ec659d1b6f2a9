//! Configuration types for the Parallel World client

use serde::{Deserialize, Serialize};

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend base URL (e.g., "http://127.0.0.1:8000")
    pub base_url: String,

    /// Session token for authenticated endpoints (empty when signed out)
    #[serde(default)]
    pub session_token: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            session_token: String::new(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend connection settings
    pub backend: BackendConfig,

    /// Background status refresh interval in seconds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert!(config.backend.session_token.is_empty());
        assert_eq!(config.refresh_interval_secs, 60);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.backend.base_url, config.backend.base_url);
    }

    #[test]
    fn test_refresh_interval_defaults_when_missing() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"backend":{"base_url":"http://h:1"}}"#).unwrap();
        assert_eq!(parsed.refresh_interval_secs, 60);
    }
}
