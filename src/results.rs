use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Status code recorded when a transport fails before receiving a response
pub const TRANSPORT_FAILURE_STATUS: u16 = 999;

/// Normalized outcome of a single transport request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// HTTP status (or [`TRANSPORT_FAILURE_STATUS`])
    pub status_code: u16,

    /// Whether the page body is usable
    pub success: bool,

    /// Raw response body
    #[serde(default)]
    pub body: String,

    /// Content type label, `"html"` for HTML documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Final URL after redirects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_url: Option<String>,

    /// Response headers, keys lower-cased
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Structured hints supplied by the transport (e.g. pre-parsed OpenGraph)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,

    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,

    /// Name of the transport that produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    /// Credits charged by the rendering proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    /// Status the rendering proxy saw from the origin server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_status_code: Option<u16>,
}

impl FetchResult {
    /// A successful result carrying `body`
    pub fn success(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            success: true,
            body: body.into(),
            ..Self::default()
        }
    }

    /// A failed result with the given description
    pub fn failure(status_code: u16, error_text: impl Into<String>) -> Self {
        Self {
            status_code,
            success: false,
            error_text: Some(error_text.into()),
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_resolved_url(mut self, resolved_url: impl Into<String>) -> Self {
        self.resolved_url = Some(resolved_url.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a header, lower-casing its name
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// The failure text, or an empty string
    pub fn error_text(&self) -> &str {
        self.error_text.as_deref().unwrap_or_default()
    }

    /// Whether the body should be parsed as an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref() == Some("html")
    }
}

/// Flat record of everything extracted from a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub site_name: Option<String>,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub authors: Vec<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub open_graph: BTreeMap<String, String>,
    pub meta_tags: BTreeMap<String, String>,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub resolved_url: Option<String>,
    pub feeds: Vec<String>,
    pub published_at: Vec<String>,
    /// Unsanitized response body
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_lowercased() {
        let result = FetchResult::success(200, "").with_header("Content-Type", "text/html");
        assert_eq!(
            result.headers.get("content-type").map(String::as_str),
            Some("text/html")
        );
    }

    #[test]
    fn test_failure_carries_text() {
        let result = FetchResult::failure(TRANSPORT_FAILURE_STATUS, "connection refused");
        assert!(!result.success);
        assert_eq!(result.error_text(), "connection refused");
        assert!(!result.is_html());
    }
}
