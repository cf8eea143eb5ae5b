//! Source citations attached to an answer.

use serde::{Deserialize, Serialize};

/// A document a handler used to ground its answer.
///
/// Opaque to the protocol: handlers produce it and it travels to the client
/// unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl SourceRef {
    /// Creates a source with only a title and URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content_snippet: None,
            thumbnail_url: None,
        }
    }

    /// Sets the content snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.content_snippet = Some(snippet.into());
        self
    }

    /// Sets the thumbnail URL.
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_and_skips_missing_fields() {
        let source = SourceRef::new("Forecast", "https://weather.example/today");
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "Forecast", "url": "https://weather.example/today"})
        );
    }

    #[test]
    fn optional_fields_round_through_wire_names() {
        let json = r#"{
            "title": "Video",
            "url": "https://youtube.example/v",
            "contentSnippet": "a clip",
            "thumbnailUrl": "https://img.example/t.jpg"
        }"#;
        let source: SourceRef = serde_json::from_str(json).unwrap();
        assert_eq!(source.content_snippet.as_deref(), Some("a clip"));
        assert_eq!(source.thumbnail_url.as_deref(), Some("https://img.example/t.jpg"));
    }
}
