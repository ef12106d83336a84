//! Client configuration.
//!
//! Resolved once at startup; the demo flag selects which API implementation
//! gets constructed (see [`crate::connect`]), it is never consulted again.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, no trailing slash. Endpoints are appended verbatim.
    pub base_url: String,
    /// Fabricate responses instead of calling the network.
    pub demo: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Interval for the background refresh loop.
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            demo: false,
            request_timeout: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(120),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `EXECSEC_BASE_URL` and `EXECSEC_DEMO`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("EXECSEC_BASE_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(flag) = std::env::var("EXECSEC_DEMO") {
            config.demo = matches!(flag.trim(), "1" | "true" | "yes");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert!(!config.demo);
        assert_eq!(config.refresh_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("EXECSEC_BASE_URL", "https://api.example.com/v1/");
        std::env::set_var("EXECSEC_DEMO", "true");

        let config = ClientConfig::from_env();
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert!(config.demo);

        std::env::remove_var("EXECSEC_BASE_URL");
        std::env::remove_var("EXECSEC_DEMO");
    }
}
