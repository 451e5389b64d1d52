use std::time::Duration;

use anyhow::{Context, Result};
use client::HttpScenarioApi;
use config::{Config, Environment, Map};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "salesdemo=info,client=info";

/// Runtime settings, read from `SALESDEMO_*` environment variables (a `.env`
/// file is honoured).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Root of the scenario collection, e.g. `http://localhost:5001/api`
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(None)
    }

    /// Load settings from `vars` instead of the process environment.
    pub fn from_source(vars: Option<Map<String, String>>) -> Result<Self> {
        let settings = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("log_filter", DEFAULT_LOG_FILTER)?
            .add_source(
                Environment::with_prefix("SALESDEMO")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize::<Settings>()
            .context("Invalid configuration")?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP client for the configured collection.
    pub fn api(&self) -> Result<HttpScenarioApi> {
        HttpScenarioApi::with_timeout(&self.api_base_url, self.request_timeout())
            .with_context(|| format!("Cannot use API base URL '{}'", self.api_base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_source(vars(&[])).unwrap();
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_source(vars(&[
            ("SALESDEMO_API_BASE_URL", "https://demo.example.com/api"),
            ("SALESDEMO_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.api_base_url, "https://demo.example.com/api");
        assert_eq!(settings.request_timeout_secs, 5);
        assert_eq!(
            settings.api().unwrap().base_url().as_str(),
            "https://demo.example.com/api"
        );
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let result = Settings::from_source(vars(&[("SALESDEMO_REQUEST_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let settings = Settings::from_source(vars(&[("SALESDEMO_API_BASE_URL", "nowhere")])).unwrap();
        assert!(settings.api().is_err());
    }
}
