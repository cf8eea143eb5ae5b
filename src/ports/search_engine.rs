//! Search Engine Port - meta-search used to ground answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::SourceRef;

/// Port for web search backends.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Runs one search.
    async fn search(&self, query: &str, options: &SearchOptions)
        -> Result<SearchResults, SearchError>;
}

/// Optional search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub categories: Vec<String>,
    pub engines: Vec<String>,
    pub language: Option<String>,
    pub page: Option<u32>,
    /// Restricts results to one site.
    pub domain: Option<String>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = engines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// One search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub img_src: Option<String>,
    #[serde(default)]
    pub thumbnail_src: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl SearchHit {
    /// Text used as context and for reranking.
    pub fn page_content(&self) -> &str {
        self.content.as_deref().unwrap_or(&self.title)
    }

    /// Converts the hit into the citation sent to clients.
    pub fn to_source(&self) -> SourceRef {
        let mut source = SourceRef::new(self.title.clone(), self.url.clone());
        source.content_snippet = Some(self.page_content().to_string());
        source.thumbnail_url = self.thumbnail_src.clone().or_else(|| self.img_src.clone());
        source
    }
}

/// Results plus engine suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Search backend errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Network(String),

    #[error("search engine returned status {status}")]
    Status { status: u16 },

    #[error("failed to parse search response: {0}")]
    Parse(String),

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
}
