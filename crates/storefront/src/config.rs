//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COPPERLEAF_API_URL` - Base URL of the backend REST API
//!   (e.g., `https://api.example.com/api/v1/`)
//!
//! ## Optional
//! - `COPPERLEAF_API_TOKEN` - Bearer token attached to every request
//! - `COPPERLEAF_HTTP_TIMEOUT_SECS` - Request timeout (default: 30)
//! - `COPPERLEAF_STATE_DIR` - Directory for locally persisted state such as
//!   the guest cart (default: `.copperleaf`)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_STATE_DIR: &str = ".copperleaf";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend REST API.
    pub api_base_url: Url,
    /// Bearer token for authenticated requests, if the session has one.
    pub api_token: Option<SecretString>,
    /// HTTP request timeout.
    pub http_timeout: Duration,
    /// Directory for locally persisted state (guest cart).
    pub state_dir: PathBuf,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("http_timeout", &self.http_timeout)
            .field("state_dir", &self.state_dir)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("COPPERLEAF_API_URL")?)?;
        let api_token = get_optional_env("COPPERLEAF_API_TOKEN").map(SecretString::from);
        let http_timeout = parse_timeout(&get_env_or_default(
            "COPPERLEAF_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        ))?;
        let state_dir =
            PathBuf::from(get_env_or_default("COPPERLEAF_STATE_DIR", DEFAULT_STATE_DIR));

        Ok(Self {
            api_base_url,
            api_token,
            http_timeout,
            state_dir,
        })
    }

    /// Construct a configuration for a given base URL with defaults
    /// everywhere else. Useful for tests and embedded hosts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` does not parse as an URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            api_token: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and normalize the API base URL. A trailing slash is required for
/// relative path joins to behave, so one is appended when missing.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("COPPERLEAF_API_URL".to_string(), e.to_string()))
}

/// Parse the HTTP timeout in seconds.
fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
        ConfigError::InvalidEnvVar("COPPERLEAF_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_trailing_slash() {
        let url = parse_base_url("https://api.example.com/api/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/");

        // Joins stay under the base path only with the trailing slash
        let joined = url.join("product").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/api/v1/product");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let result = parse_base_url("not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("15").unwrap(), Duration::from_secs(15));
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = StorefrontConfig::for_base_url("https://api.example.com/").unwrap();
        config.api_token = Some(SecretString::from("super-secret-bearer"));

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-bearer"));
    }
}
