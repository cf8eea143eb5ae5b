//! Search backend configuration

use serde::Deserialize;

use crate::application::focus_handlers::AnswerSettings;

use super::error::{check_http_url, ValidationError};

/// SearxNG and source selection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// SearxNG base URL, e.g. `http://localhost:8080`
    pub searxng_url: Option<String>,

    /// Maximum number of sources attached to one answer
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Minimum cosine similarity for a reranked source
    #[serde(default = "default_rerank_threshold")]
    pub rerank_threshold: f32,
}

impl SearchConfig {
    pub fn answer_settings(&self) -> AnswerSettings {
        AnswerSettings {
            max_sources: self.max_sources,
            rerank_threshold: self.rerank_threshold,
        }
    }

    /// Validate search configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self
            .searxng_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ValidationError::MissingRequired("FOCUS_RELAY__SEARCH__SEARXNG_URL"))?;
        check_http_url("searxng_url", url)?;

        if self.max_sources == 0 {
            return Err(ValidationError::InvalidMaxSources);
        }
        if !(-1.0..=1.0).contains(&self.rerank_threshold) {
            return Err(ValidationError::InvalidRerankThreshold);
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            searxng_url: None,
            max_sources: default_max_sources(),
            rerank_threshold: default_rerank_threshold(),
        }
    }
}

fn default_max_sources() -> usize {
    15
}

fn default_rerank_threshold() -> f32 {
    0.3
}
