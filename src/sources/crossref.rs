//! CrossRef bibliographic cross-reference.

use async_trait::async_trait;
use serde::Deserialize;

use super::http::{base_url, HttpClient};
use super::{CitationVerifier, SourceError};
use crate::models::Citation;

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// Minimum Jaro-Winkler similarity between the cited and the recorded title
const TITLE_MATCH_THRESHOLD: f64 = 0.85;

/// Verifies citations against the CrossRef REST API
///
/// Citations with a DOI are looked up directly under `/works/{doi}`; the
/// rest go through a bibliographic query and the top hit is compared.
#[derive(Debug, Clone)]
pub struct CrossRefVerifier {
    client: HttpClient,
    base_url: String,
}

impl CrossRefVerifier {
    pub fn new(mailto: Option<&str>) -> Result<Self, SourceError> {
        Self::with_base_url(CROSSREF_API_BASE, mailto)
    }

    pub fn with_base_url(url: &str, mailto: Option<&str>) -> Result<Self, SourceError> {
        let user_agent = match mailto {
            Some(mail) => format!(
                "{}/{} (mailto:{})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                mail
            ),
            None => format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        };
        Ok(Self {
            client: HttpClient::with_user_agent(&user_agent)?,
            base_url: base_url(url)?,
        })
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Option<T>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to query CrossRef: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimit);
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "CrossRef API returned status: {}",
                status
            )));
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| SourceError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

fn titles_match(cited: &str, recorded: &[String]) -> bool {
    let cited = cited.trim().to_lowercase();
    if cited.is_empty() {
        // Nothing to compare against; existence is enough
        return true;
    }
    recorded
        .iter()
        .any(|t| strsim::jaro_winkler(&cited, &t.trim().to_lowercase()) >= TITLE_MATCH_THRESHOLD)
}

#[async_trait]
impl CitationVerifier for CrossRefVerifier {
    fn id(&self) -> &str {
        "crossref"
    }

    async fn verify(&self, citation: &Citation) -> Result<bool, SourceError> {
        let title = citation.title.as_deref().unwrap_or_default();

        if let Some(doi) = citation.doi.as_deref().filter(|d| !d.trim().is_empty()) {
            let url = format!("{}/works/{}", self.base_url, doi.trim());
            let work: Option<CRWorkResponse> = self.fetch(&url).await?;
            return Ok(work
                .map(|w| titles_match(title, &w.message.title))
                .unwrap_or(false));
        }

        if title.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "citation has neither DOI nor title".to_string(),
            ));
        }

        let query = format!("{} {}", title, citation.authors);
        let url = format!(
            "{}/works?query.bibliographic={}&rows=1",
            self.base_url,
            urlencoding::encode(query.trim())
        );
        let search: Option<CRSearchResponse> = self.fetch(&url).await?;

        Ok(search
            .and_then(|s| s.message.items.into_iter().next())
            .map(|item| titles_match(title, &item.title))
            .unwrap_or(false))
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRWorkResponse {
    message: CRItem,
}

#[derive(Debug, Deserialize)]
struct CRSearchResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(default)]
    title: Vec<String>,
}
