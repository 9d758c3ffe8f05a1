//! Shared HTTP plumbing for the network-backed sources.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::SourceError;

/// Pooled HTTP client used by the DOI resolver and the CrossRef verifier
///
/// The governor enforces the per-call timeout; the client timeout only
/// bounds connections the governor has already given up on.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
    }

    /// Create a new HTTP client with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }
}

/// Validate and normalize a base URL, dropping any trailing slash
pub(crate) fn base_url(raw: &str) -> Result<String, SourceError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| SourceError::InvalidRequest(format!("Invalid base URL '{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed.as_str().trim_end_matches('/').to_string()),
        scheme => Err(SourceError::InvalidRequest(format!(
            "Unsupported URL scheme: {}",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("https://doi.org/").unwrap(), "https://doi.org");
        assert_eq!(
            base_url("http://127.0.0.1:1234").unwrap(),
            "http://127.0.0.1:1234"
        );
        assert!(base_url("ftp://example.com").is_err());
        assert!(base_url("not a url").is_err());
    }
}
