//! Client configuration.
//!
//! Values come from the environment (optionally seeded from a `.env` file):
//!
//! | Variable                    | Default                  |
//! |-----------------------------|--------------------------|
//! | `FINANCE_API_URL`           | `http://localhost:3000`  |
//! | `FINANCE_UPLOADS_URL`       | `<api url>/uploads`      |
//! | `FINANCE_REQUEST_TIMEOUT`   | `30` (seconds)           |

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const API_URL_VAR: &str = "FINANCE_API_URL";
pub const UPLOADS_URL_VAR: &str = "FINANCE_UPLOADS_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "FINANCE_REQUEST_TIMEOUT";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    api_url: String,
    uploads_url: String,
    request_timeout: Duration,
}

impl ClientConfig {
    /// Config for the given API base URL, uploads served from `<api_url>/uploads`
    pub fn new(api_url: impl Into<String>) -> Result<Self, ApiError> {
        let api_url = normalize_url(&api_url.into())?;
        let uploads_url = format!("{}/uploads", api_url);
        Ok(Self {
            api_url,
            uploads_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ApiError> {
        report_dotenv(&load_dotenv());
        Self::from_process_env()
    }

    /// Load from the process environment as it is, without reading `.env`
    pub fn from_process_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url)?;

        if let Some(uploads_url) = lookup(UPLOADS_URL_VAR) {
            config = config.with_uploads_url(uploads_url)?;
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config = config.with_request_timeout(Duration::from_secs(secs)),
                _ => warn!(
                    "Ignoring {}='{}', using {}s",
                    REQUEST_TIMEOUT_VAR,
                    raw,
                    DEFAULT_REQUEST_TIMEOUT.as_secs()
                ),
            }
        }

        Ok(config)
    }

    pub fn with_uploads_url(mut self, uploads_url: impl Into<String>) -> Result<Self, ApiError> {
        self.uploads_url = normalize_url(&uploads_url.into())?;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn uploads_url(&self) -> &str {
        &self.uploads_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Seed the process environment from `.env`.
///
/// Returns the file that was read, or `None` when there is none.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    dotenv_outcome(dotenvy::dotenv())
}

fn dotenv_outcome(result: Result<PathBuf, dotenvy::Error>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Log the outcome of [`load_dotenv`]; an unreadable file is ignored
pub fn report_dotenv(outcome: &Result<Option<PathBuf>, dotenvy::Error>) {
    match outcome {
        Ok(Some(path)) => debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// Trim whitespace and trailing slashes, require an http(s) scheme
fn normalize_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());

    if !has_host {
        return Err(ApiError::InvalidUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url(), "http://localhost:3000");
        assert_eq!(config.uploads_url(), "http://localhost:3000/uploads");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_VAR, "https://api.example.com/"),
            (UPLOADS_URL_VAR, "https://cdn.example.com/img//"),
            (REQUEST_TIMEOUT_VAR, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_url(), "https://api.example.com");
        assert_eq!(config.uploads_url(), "https://cdn.example.com/img");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[(REQUEST_TIMEOUT_VAR, "soon")])).unwrap();
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            ClientConfig::new("localhost:3000"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(ClientConfig::new("http://").is_err());
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let missing = dotenvy::Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "no .env"));
        assert!(matches!(dotenv_outcome(Err(missing)), Ok(None)));

        let found = dotenv_outcome(Ok(PathBuf::from("/srv/app/.env"))).unwrap();
        assert_eq!(found, Some(PathBuf::from("/srv/app/.env")));

        let unreadable = dotenvy::Error::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        assert!(dotenv_outcome(Err(unreadable)).is_err());
    }
}
