use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::parsers::{self, html, sanitize};
use crate::results::FetchResult;
use crate::transports::{self, FetchParams, Transport};
use crate::urls::UrlPatterns;
use scraper::Html;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Failure text a transport returns when the page needs script rendering
pub const RENDER_REQUIRED_SIGNAL: &str = "try with render_js";

/// Attempts made by [`Page::fetch`]: the first, plus one rendered retry
pub const MAX_FETCH_ATTEMPTS: usize = 2;

/// Label reported by [`Page::content_type_label`] when there is no document
pub const UNKNOWN_CONTENT_TYPE: &str = "unknown";

static DEFAULT_PATTERNS: LazyLock<UrlPatterns> = LazyLock::new(UrlPatterns::default);

/// A single web page: its fetch outcome and everything derived from it.
///
/// Derived fields are computed on first access and cached for the page's
/// lifetime. Sanitization works on a copy of the document, so resolvers stay
/// valid after [`Page::clean_html`] has run.
#[derive(Debug, Default)]
pub struct Page {
    url: String,
    fetch_result: Option<FetchResult>,
    succeeded: Option<bool>,
    error_text: Option<String>,
    attempts: usize,
    /// `None` uses the built-in tables
    patterns: Option<UrlPatterns>,
    fields: Fields,
}

/// Memoized derivations
#[derive(Debug, Default)]
struct Fields {
    document: OnceCell<Option<Html>>,
    open_graph: OnceCell<BTreeMap<String, String>>,
    meta_tags: OnceCell<BTreeMap<String, String>>,
    titles: OnceCell<Vec<String>>,
    descriptions: OnceCell<Vec<String>>,
    authors: OnceCell<Vec<String>>,
    published_dates: OnceCell<Vec<String>>,
    headings: OnceCell<Vec<String>>,
    paragraphs: OnceCell<Vec<String>>,
    feeds: OnceCell<Vec<String>>,
    site_name: OnceCell<Option<String>>,
    content_type_label: OnceCell<Option<String>>,
}

impl Page {
    /// Create an unfetched page for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create a page from a result fetched elsewhere
    pub fn with_fetch_result(url: impl Into<String>, result: FetchResult) -> Self {
        let mut page = Self::new(url);
        page.record_outcome(result);
        page
    }

    /// Use `patterns` instead of the built-in URL heuristics
    pub fn with_patterns(mut self, patterns: UrlPatterns) -> Self {
        self.patterns = Some(patterns);
        self.fields = Fields::default();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `None` until a fetch has been attempted
    pub fn succeeded(&self) -> Option<bool> {
        self.succeeded
    }

    /// Failure text of the last attempt, if the fetch failed
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    /// Number of transport requests made so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn fetch_result(&self) -> Option<&FetchResult> {
        self.fetch_result.as_ref()
    }

    /// Fetch with the transport selected from the environment's configuration
    pub async fn fetch(&mut self, render_required: bool) -> Result<bool> {
        self.fetch_with_config(&FetchConfig::from_env(), render_required)
            .await
    }

    pub async fn fetch_with_config(
        &mut self,
        config: &FetchConfig,
        render_required: bool,
    ) -> Result<bool> {
        if self.succeeded != Some(true) {
            self.patterns = Some(UrlPatterns::new(config.url_patterns.clone())?);
        }
        let transport = transports::select_transport(config)?;
        let params = FetchParams {
            render_required,
            screenshot: config.screenshot,
        };
        self.run_attempts(transport.as_ref(), params).await
    }

    /// Fetch through `transport`.
    ///
    /// Makes at most [`MAX_FETCH_ATTEMPTS`] requests. A failure mentioning
    /// [`RENDER_REQUIRED_SIGNAL`] is retried once with rendering enabled; any
    /// other failure is final. Only validation problems are returned as `Err`;
    /// a failed fetch shows up as `Ok(false)` with [`Page::error_text`] set.
    pub async fn fetch_with(
        &mut self,
        transport: &dyn Transport,
        render_required: bool,
    ) -> Result<bool> {
        let params = FetchParams {
            render_required,
            ..FetchParams::default()
        };
        self.run_attempts(transport, params).await
    }

    async fn run_attempts(&mut self, transport: &dyn Transport, mut params: FetchParams) -> Result<bool> {
        if self.succeeded == Some(true) {
            ::log::debug!("{} already fetched, skipping", self.url);
            return Ok(true);
        }

        let mut last_failure = None;
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            ::log::info!(
                "Fetching {} (attempt {}, render_js={})",
                self.url,
                attempt,
                params.render_required
            );
            self.attempts += 1;
            let result = transports::fetch_url(transport, &self.url, &params).await?;

            if result.success {
                self.record_outcome(result);
                return Ok(true);
            }

            if result.error_text().contains(RENDER_REQUIRED_SIGNAL) {
                ::log::info!("{} needs script rendering, retrying", self.url);
                params.render_required = true;
                last_failure = Some(result);
                continue;
            }

            last_failure = Some(result);
            break;
        }

        let failure = last_failure
            .unwrap_or_else(|| FetchResult::failure(0, "no fetch attempt was made"));
        ::log::warn!("Failed to fetch {}: {}", self.url, failure.error_text());
        self.record_outcome(failure);
        Ok(false)
    }

    fn record_outcome(&mut self, result: FetchResult) {
        if result.success {
            self.succeeded = Some(true);
            self.error_text = None;
            self.fetch_result = Some(result);
        } else {
            self.succeeded = Some(false);
            self.error_text = Some(result.error_text().to_string());
        }
        self.fields = Fields::default();
    }

    fn fetched(&self) -> Result<&FetchResult> {
        self.fetch_result.as_ref().ok_or(Error::NoDataAvailable)
    }

    /// Raw response body
    pub fn html(&self) -> Result<&str> {
        Ok(&self.fetched()?.body)
    }

    /// Final URL after redirects, if the transport reported one
    pub fn resolved_url(&self) -> Result<Option<&str>> {
        Ok(self.fetched()?.resolved_url.as_deref())
    }

    /// Parsed document, `None` for non-HTML content or an empty body
    pub fn document(&self) -> Result<Option<&Html>> {
        let result = self.fetched()?;
        Ok(self
            .fields
            .document
            .get_or_init(|| parsers::load_document(result))
            .as_ref())
    }

    pub fn open_graph(&self) -> Result<&BTreeMap<String, String>> {
        let result = self.fetched()?;
        Ok(self
            .fields
            .open_graph
            .get_or_init(|| html::open_graph(result.metadata.as_ref())))
    }

    pub fn meta_tags(&self) -> Result<&BTreeMap<String, String>> {
        let document = self.document()?;
        Ok(self
            .fields
            .meta_tags
            .get_or_init(|| document.map(html::meta_tags).unwrap_or_default()))
    }

    pub fn titles(&self) -> Result<&[String]> {
        self.sequence(&self.fields.titles, html::titles)
    }

    pub fn descriptions(&self) -> Result<&[String]> {
        self.sequence(&self.fields.descriptions, html::descriptions)
    }

    pub fn authors(&self) -> Result<&[String]> {
        self.sequence(&self.fields.authors, html::authors)
    }

    pub fn published_dates(&self) -> Result<&[String]> {
        self.sequence(&self.fields.published_dates, html::published_dates)
    }

    pub fn headings(&self) -> Result<&[String]> {
        self.sequence(&self.fields.headings, html::headings)
    }

    pub fn paragraphs(&self) -> Result<&[String]> {
        self.sequence(&self.fields.paragraphs, html::paragraphs)
    }

    pub fn feeds(&self) -> Result<&[String]> {
        self.sequence(&self.fields.feeds, html::feeds)
    }

    pub fn site_name(&self) -> Result<Option<&str>> {
        let has_document = self.document()?.is_some();
        let open_graph = self.open_graph()?;
        let meta_tags = self.meta_tags()?;
        Ok(self
            .fields
            .site_name
            .get_or_init(|| {
                has_document
                    .then(|| html::site_name(open_graph, meta_tags))
                    .flatten()
            })
            .as_deref())
    }

    /// `og:type` of the page, or [`UNKNOWN_CONTENT_TYPE`] without a document
    pub fn content_type_label(&self) -> Result<Option<&str>> {
        let has_document = self.document()?.is_some();
        let open_graph = self.open_graph()?;
        let meta_tags = self.meta_tags()?;
        Ok(self
            .fields
            .content_type_label
            .get_or_init(|| {
                if has_document {
                    html::content_type_label(open_graph, meta_tags)
                } else {
                    Some(UNKNOWN_CONTENT_TYPE.to_string())
                }
            })
            .as_deref())
    }

    /// Sanitized, compacted HTML, optionally capped at `max_bytes`
    pub fn clean_html(&self, max_bytes: Option<usize>) -> Result<String> {
        Ok(self
            .document()?
            .map(|document| sanitize::clean_html(document, max_bytes))
            .unwrap_or_default())
    }

    fn sequence<'a>(
        &'a self,
        cell: &'a OnceCell<Vec<String>>,
        resolve: fn(&html::FieldSources<'_>) -> Vec<String>,
    ) -> Result<&'a [String]> {
        if let Some(values) = cell.get() {
            return Ok(values);
        }

        let values = match self.sources()? {
            Some(sources) => resolve(&sources),
            None => Vec::new(),
        };
        Ok(cell.get_or_init(|| values))
    }

    fn sources(&self) -> Result<Option<html::FieldSources<'_>>> {
        let Some(document) = self.document()? else {
            return Ok(None);
        };
        let result = self.fetched()?;

        Ok(Some(html::FieldSources {
            document,
            open_graph: self.open_graph()?,
            meta_tags: self.meta_tags()?,
            url: &self.url,
            resolved_url: result.resolved_url.as_deref(),
            patterns: self.patterns.as_ref().unwrap_or(&DEFAULT_PATTERNS),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::tests::ScriptedTransport;
    use crate::urls::UrlPatternsConfig;
    use serde_json::{Map, json};
    use std::io::ErrorKind;

    fn html_result(body: &str) -> FetchResult {
        FetchResult::success(200, body).with_content_type("html")
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![Ok(html_result("<title>Hi</title>"))]);
        let mut page = Page::new("https://example.com/a");

        assert!(page.fetch_with(&transport, false).await.unwrap());
        assert_eq!(page.succeeded(), Some(true));
        assert_eq!(page.attempts(), 1);
        assert_eq!(transport.calls(), vec![FetchParams::default()]);
        assert_eq!(page.titles().unwrap(), ["Hi"]);
    }

    #[tokio::test]
    async fn test_render_signal_triggers_one_rendered_retry() {
        let transport = ScriptedTransport::new(vec![
            Ok(FetchResult::failure(500, "please try with render_js")),
            Ok(html_result("<title>Rendered</title>")),
        ]);
        let mut page = Page::new("https://example.com/a");

        assert!(page.fetch_with(&transport, false).await.unwrap());
        assert_eq!(page.succeeded(), Some(true));
        assert_eq!(
            transport.calls(),
            vec![FetchParams::default(), FetchParams::rendered()]
        );
        assert_eq!(page.titles().unwrap(), ["Rendered"]);
    }

    #[tokio::test]
    async fn test_generic_failure_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(FetchResult::failure(404, "Not Found")),
            Ok(html_result("<title>unreachable</title>")),
        ]);
        let mut page = Page::new("https://example.com/missing");

        assert!(!page.fetch_with(&transport, false).await.unwrap());
        assert_eq!(page.succeeded(), Some(false));
        assert_eq!(page.error_text(), Some("Not Found"));
        assert_eq!(transport.calls().len(), 1);
        assert!(page.fetch_result().is_none());
        assert!(matches!(page.titles(), Err(Error::NoDataAvailable)));
    }

    #[tokio::test]
    async fn test_render_signal_twice_ends_in_failure() {
        let transport = ScriptedTransport::new(vec![
            Ok(FetchResult::failure(500, "try with render_js")),
            Ok(FetchResult::failure(500, "still try with render_js")),
            Ok(html_result("<title>third</title>")),
        ]);
        let mut page = Page::new("https://example.com/a");

        assert!(!page.fetch_with(&transport, false).await.unwrap());
        assert_eq!(transport.calls().len(), MAX_FETCH_ATTEMPTS);
        assert_eq!(page.error_text(), Some("still try with render_js"));
    }

    #[tokio::test]
    async fn test_transport_fault_becomes_failure_state() {
        let transport = ScriptedTransport::new(vec![Err(Error::Io(std::io::Error::new(
            ErrorKind::ConnectionReset,
            "connection reset",
        )))]);
        let mut page = Page::new("https://example.com/a");

        assert!(!page.fetch_with(&transport, false).await.unwrap());
        assert_eq!(page.succeeded(), Some(false));
        assert!(page.error_text().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_validation_error() {
        let transport = ScriptedTransport::new(vec![]);
        let mut page = Page::new("");

        assert!(matches!(
            page.fetch_with(&transport, false).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(page.succeeded(), None);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_fetch_is_a_no_op() {
        let transport = ScriptedTransport::new(vec![Ok(html_result("<title>Once</title>"))]);
        let mut page = Page::new("https://example.com/a");

        assert!(page.fetch_with(&transport, false).await.unwrap());
        assert!(page.fetch_with(&transport, false).await.unwrap());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_unfetched_page_has_no_data() {
        let page = Page::new("https://example.com/a");
        assert_eq!(page.succeeded(), None);
        assert!(matches!(page.titles(), Err(Error::NoDataAvailable)));
        assert!(matches!(page.open_graph(), Err(Error::NoDataAvailable)));
        assert!(matches!(page.meta_tags(), Err(Error::NoDataAvailable)));
        assert!(matches!(page.feeds(), Err(Error::NoDataAvailable)));
        assert!(matches!(page.site_name(), Err(Error::NoDataAvailable)));
        assert!(matches!(page.content_type_label(), Err(Error::NoDataAvailable)));
        assert!(matches!(page.clean_html(None), Err(Error::NoDataAvailable)));
        assert!(matches!(page.html(), Err(Error::NoDataAvailable)));
    }

    #[test]
    fn test_resolvers_are_memoized() {
        let page = Page::with_fetch_result(
            "https://example.com/a",
            html_result("<title>Same</title><h1>A heading with words</h1>"),
        );

        let first = page.titles().unwrap();
        let second = page.titles().unwrap();
        assert_eq!(first, second);
        assert!(std::ptr::eq(first.as_ptr(), second.as_ptr()));

        let first = page.headings().unwrap();
        let second = page.headings().unwrap();
        assert!(std::ptr::eq(first, second));

        let document = page.document().unwrap().unwrap();
        assert!(std::ptr::eq(document, page.document().unwrap().unwrap()));
    }

    #[test]
    fn test_sanitizing_leaves_extraction_intact() {
        let page = Page::with_fetch_result(
            "https://example.com/a",
            html_result(
                "<html><head><title>Kept</title></head><body>\
                 <nav><h2>Navigation menu heading</h2></nav><p>Body text here</p></body></html>",
            ),
        );

        let clean = page.clean_html(None).unwrap();
        assert!(!clean.contains("<title>"));
        assert!(!clean.contains("<nav>"));
        assert_eq!(page.titles().unwrap(), ["Kept"]);
        assert_eq!(page.headings().unwrap(), ["Navigation menu heading"]);
    }

    #[test]
    fn test_empty_html_body_has_no_document() {
        let page = Page::with_fetch_result(
            "https://example.com/blank",
            FetchResult::success(200, "").with_content_type("html"),
        );

        assert_eq!(page.succeeded(), Some(true));
        assert!(page.document().unwrap().is_none());
        assert!(page.titles().unwrap().is_empty());
        assert!(page.descriptions().unwrap().is_empty());
        assert!(page.authors().unwrap().is_empty());
        assert!(page.published_dates().unwrap().is_empty());
        assert!(page.headings().unwrap().is_empty());
        assert!(page.paragraphs().unwrap().is_empty());
        assert!(page.feeds().unwrap().is_empty());
        assert!(page.meta_tags().unwrap().is_empty());
        assert_eq!(page.site_name().unwrap(), None);
        assert_eq!(page.content_type_label().unwrap(), Some(UNKNOWN_CONTENT_TYPE));
        assert_eq!(page.clean_html(None).unwrap(), "");
    }

    #[test]
    fn test_open_graph_from_transport_metadata() {
        let mut metadata = Map::new();
        metadata.insert("opengraph".to_string(), json!([{"og:title": "Hello"}]));
        let page = Page::with_fetch_result(
            "https://example.com/a",
            html_result("<title>Other</title>").with_metadata(metadata),
        );

        assert_eq!(
            page.open_graph().unwrap().get("og:title").map(String::as_str),
            Some("Hello")
        );
        assert_eq!(page.titles().unwrap(), ["Hello", "Other"]);
    }

    #[test]
    fn test_feeds_resolve_against_final_url() {
        let page = Page::with_fetch_result(
            "https://short.link/x",
            html_result(r#"<a href="/feed.xml">RSS</a>"#).with_resolved_url("https://site.com/post"),
        );

        assert_eq!(page.resolved_url().unwrap(), Some("https://site.com/post"));
        assert_eq!(page.feeds().unwrap(), ["https://site.com/feed.xml"]);
    }

    #[test]
    fn test_custom_url_patterns() {
        let patterns = UrlPatterns::new(UrlPatternsConfig {
            date_pattern: r"\d{4}-\d{2}-\d{2}".to_string(),
            ..UrlPatternsConfig::default()
        })
        .unwrap();
        let page = Page::with_fetch_result(
            "https://example.com/2024-06-30/post",
            html_result("<p>Body</p>"),
        )
        .with_patterns(patterns);

        assert_eq!(page.published_dates().unwrap(), ["2024-06-30"]);
    }

    #[tokio::test]
    async fn test_invalid_configured_pattern_is_an_error() {
        let mut config = FetchConfig::default();
        config.url_patterns.feed_href_pattern = "(unclosed".to_string();
        let mut page = Page::new("https://example.com/a");

        assert!(matches!(
            page.fetch_with_config(&config, false).await,
            Err(Error::Pattern(_))
        ));
        assert_eq!(page.succeeded(), None);
        assert_eq!(page.attempts(), 0);
    }
}
