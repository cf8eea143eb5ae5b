//! SearxNG meta-search client.
//!
//! Issues `GET {base}/search?format=json&q=...`. A domain restriction is
//! expressed as a `site:` prefix on the query; list options are comma-joined.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ports::{SearchEngine, SearchError, SearchOptions, SearchResults};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP client for a SearxNG instance.
#[derive(Debug, Clone)]
pub struct SearxngClient {
    base_url: String,
    client: Client,
}

impl SearxngClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SearchError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SearchError::InvalidConfig(format!(
                "SearxNG URL must be http(s): {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for one search, in request order.
    fn query_params(query: &str, options: &SearchOptions) -> Vec<(&'static str, String)> {
        let q = match options.domain.as_deref() {
            Some(domain) => format!("site:{domain} {query}"),
            None => query.to_string(),
        };

        let mut params = vec![("format", "json".to_string()), ("q", q)];
        if !options.categories.is_empty() {
            params.push(("categories", options.categories.join(",")));
        }
        if !options.engines.is_empty() {
            params.push(("engines", options.engines.join(",")));
        }
        if let Some(language) = &options.language {
            params.push(("language", language.clone()));
        }
        if let Some(page) = options.page {
            params.push(("pageno", page.to_string()));
        }
        params
    }
}

#[async_trait]
impl SearchEngine for SearxngClient {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResults, SearchError> {
        let params = Self::query_params(query, options);
        tracing::debug!(engines = ?options.engines, domain = ?options.domain, "searching");

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let results: SearchResults = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        tracing::debug!(hits = results.results.len(), "search complete");
        Ok(results)
    }
}
