//! DOI resolution through the doi.org handle API.

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{base_url, HttpClient};
use super::{DoiResolver, SourceError};

const DOI_ORG_BASE: &str = "https://doi.org";

/// Resolves DOIs against `{base}/api/handles/{doi}`
///
/// The handle API answers 200 with `responseCode: 1` for registered DOIs and
/// 404 with `responseCode: 100` for unknown ones.
#[derive(Debug, Clone)]
pub struct DoiOrgResolver {
    client: HttpClient,
    base_url: String,
}

impl DoiOrgResolver {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(DOI_ORG_BASE)
    }

    /// Point the resolver at another handle server (tests, mirrors)
    pub fn with_base_url(url: &str) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url(url)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HandleResponse {
    #[serde(rename = "responseCode")]
    response_code: i32,
}

#[async_trait]
impl DoiResolver for DoiOrgResolver {
    fn id(&self) -> &str {
        "doi"
    }

    async fn resolve(&self, doi: &str) -> Result<bool, SourceError> {
        let url = format!(
            "{}/api/handles/{}",
            self.base_url,
            doi.split('/')
                .map(|part| urlencoding::encode(part).into_owned())
                .collect::<Vec<_>>()
                .join("/")
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to resolve DOI: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "doi.org returned status: {}",
                status
            )));
        }

        let body: HandleResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))?;

        Ok(body.response_code == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_resolve_registered_doi() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/handles/10\.1000/".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"responseCode":1,"handle":"10.1000/182"}"#)
            .create_async()
            .await;

        let resolver = DoiOrgResolver::with_base_url(&server.url()).unwrap();
        assert!(resolver.resolve("10.1000/182").await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_unknown_doi() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/handles/".to_string()))
            .with_status(404)
            .with_body(r#"{"responseCode":100}"#)
            .create_async()
            .await;

        let resolver = DoiOrgResolver::with_base_url(&server.url()).unwrap();
        assert!(!resolver.resolve("10.9999/missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let resolver = DoiOrgResolver::with_base_url(&server.url()).unwrap();
        let err = resolver.resolve("10.1000/182").await.unwrap_err();
        assert!(matches!(err, SourceError::Api(_)));
    }
}
