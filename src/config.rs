//! Backend connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const ENV_API_URL: &str = "EVALSYNC_API_URL";
pub const ENV_API_TOKEN: &str = "EVALSYNC_API_TOKEN";
pub const ENV_API_TIMEOUT_SECS: &str = "EVALSYNC_API_TIMEOUT_SECS";
pub const ENV_PAGE_SIZE: &str = "EVALSYNC_PAGE_SIZE";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Where the REST backend lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL without a trailing slash, e.g. `https://eval.example.edu/api`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Page size requested from paginated listings.
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            token: None,
            timeout_secs: 30,
            page_size: 100,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Defaults overridden by the `EVALSYNC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    var: ENV_API_URL,
                    value: url,
                });
            }
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.is_empty()) {
            config.token = Some(token);
        }
        if let Some(raw) = lookup(ENV_API_TIMEOUT_SECS) {
            config.timeout_secs = parse_positive(ENV_API_TIMEOUT_SECS, raw)?;
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            config.page_size = parse_positive(ENV_PAGE_SIZE, raw)?;
        }
        Ok(config)
    }
}

fn parse_positive<T>(var: &'static str, raw: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::Invalid { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn env_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://eval.example.edu/api/"),
            (ENV_API_TOKEN, "secret"),
            (ENV_API_TIMEOUT_SECS, "5"),
            (ENV_PAGE_SIZE, "25"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://eval.example.edu/api");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            ApiConfig::from_lookup(lookup(&[(ENV_PAGE_SIZE, "0")])),
            Err(ConfigError::Invalid {
                var: ENV_PAGE_SIZE,
                value: "0".into()
            })
        );
        assert!(ApiConfig::from_lookup(lookup(&[(ENV_API_TIMEOUT_SECS, "soon")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[(ENV_API_URL, "ftp://nope")])).is_err());
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ApiConfig =
            serde_json::from_str(r#"{ "base_url": "http://api.local", "page_size": 10 }"#).unwrap();
        assert_eq!(config.base_url, "http://api.local");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timeout_secs, 30);
    }
}
