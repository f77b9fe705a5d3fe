//! Base-URL resolution.
//!
//! The backend address comes from `DELIVERY_API_ENDPOINT` (a `.env` file is
//! honoured) and falls back to the address of the development backend. The
//! resolved URL is fixed for the lifetime of whatever client is built from it.

use std::env;

/// Environment variable holding the backend base URL.
pub const ENDPOINT_VAR: &str = "DELIVERY_API_ENDPOINT";

/// Used when `DELIVERY_API_ENDPOINT` is unset or empty.
pub const FALLBACK_BASE_URL: &str = "http://192.168.1.165:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::resolve(env::var(ENDPOINT_VAR).ok())
    }

    fn resolve(endpoint: Option<String>) -> Self {
        match endpoint.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Self::new(url),
            _ => {
                tracing::debug!(fallback = FALLBACK_BASE_URL, "{ENDPOINT_VAR} not set");
                Self::new(FALLBACK_BASE_URL)
            }
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(FALLBACK_BASE_URL)
    }
}
