//! FocusMode enum naming the answer strategies a client can select.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The answer strategies a client can pick for a query.
///
/// The wire uses camelCase identifiers (`webSearch`, `academicSearch`, ...).
/// Which modes are actually served is decided by the handler registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusMode {
    WebSearch,
    WebSearchDomain,
    AcademicSearch,
    WritingAssistant,
    WolframAlphaSearch,
    YoutubeSearch,
    RedditSearch,
}

impl FocusMode {
    /// Returns all focus modes in canonical order.
    pub fn all() -> &'static [FocusMode] {
        &[
            FocusMode::WebSearch,
            FocusMode::WebSearchDomain,
            FocusMode::AcademicSearch,
            FocusMode::WritingAssistant,
            FocusMode::WolframAlphaSearch,
            FocusMode::YoutubeSearch,
            FocusMode::RedditSearch,
        ]
    }

    /// Wire identifier of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusMode::WebSearch => "webSearch",
            FocusMode::WebSearchDomain => "webSearchDomain",
            FocusMode::AcademicSearch => "academicSearch",
            FocusMode::WritingAssistant => "writingAssistant",
            FocusMode::WolframAlphaSearch => "wolframAlphaSearch",
            FocusMode::YoutubeSearch => "youtubeSearch",
            FocusMode::RedditSearch => "redditSearch",
        }
    }

    /// True for the variants that restrict search to a single site.
    ///
    /// Only these modes receive the request's `domain`.
    pub fn is_domain_scoped(&self) -> bool {
        matches!(self, FocusMode::WebSearchDomain)
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FocusMode::all()
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ValidationError::unknown_value("focusMode", s))
    }
}
