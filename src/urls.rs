use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Regex tables used by the extraction heuristics that look at URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlPatternsConfig {
    /// URLs matching any of these are treated as code-hosting pages
    #[serde(default = "default_code_hosting_patterns")]
    pub code_hosting_patterns: Vec<String>,

    /// Hrefs matching this are feed candidates
    #[serde(default = "default_feed_href_pattern")]
    pub feed_href_pattern: String,

    /// Publication date embedded in a URL path
    #[serde(default = "default_date_pattern")]
    pub date_pattern: String,
}

fn default_code_hosting_patterns() -> Vec<String> {
    vec![
        r"^https?://(www\.)?github\.com/".to_string(),
        r"^https?://(www\.)?gitlab\.com/".to_string(),
        r"^https?://(www\.)?bitbucket\.org/".to_string(),
        r"^https?://(www\.)?codeberg\.org/".to_string(),
        r"^https?://(git\.)?sr\.ht/".to_string(),
    ]
}

fn default_feed_href_pattern() -> String {
    "rss|feed".to_string()
}

fn default_date_pattern() -> String {
    r"\d{4}/\d{2}/\d{2}".to_string()
}

impl Default for UrlPatternsConfig {
    fn default() -> Self {
        Self {
            code_hosting_patterns: default_code_hosting_patterns(),
            feed_href_pattern: default_feed_href_pattern(),
            date_pattern: default_date_pattern(),
        }
    }
}

/// Compiled form of [`UrlPatternsConfig`]
#[derive(Debug)]
pub struct UrlPatterns {
    code_hosting: Vec<Regex>,
    feed_href: Regex,
    date: Regex,
}

impl Default for UrlPatterns {
    fn default() -> Self {
        Self::new(UrlPatternsConfig::default()).expect("Default regex patterns should be valid")
    }
}

impl UrlPatterns {
    /// Compile the patterns of `config`
    pub fn new(config: UrlPatternsConfig) -> Result<Self, regex::Error> {
        let mut code_hosting = Vec::with_capacity(config.code_hosting_patterns.len());
        for pattern in &config.code_hosting_patterns {
            code_hosting.push(Regex::new(pattern)?);
        }

        Ok(Self {
            code_hosting,
            feed_href: Regex::new(&config.feed_href_pattern)?,
            date: Regex::new(&config.date_pattern)?,
        })
    }

    /// Whether the URL points at a code-hosting site
    pub fn is_code_hosting(&self, url: &str) -> bool {
        self.code_hosting.iter().any(|regex| regex.is_match(url))
    }

    /// Whether an anchor href looks like a syndication feed
    pub fn is_feed_href(&self, href: &str) -> bool {
        self.feed_href.is_match(href)
    }

    /// The first `YYYY/MM/DD` date found in the URL
    pub fn date_in_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        self.date.find(url).map(|m| m.as_str())
    }
}

/// Check that `url` is non-empty and an absolute URI
pub fn validate(url: &str) -> Result<Url> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Validation("URL is empty".to_string()));
    }

    Url::parse(url).map_err(|e| Error::Validation(format!("URL is not valid: {e}")))
}

/// Resolve a possibly relative `href` against `base`
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            ::log::debug!("Could not resolve {} against {}: {}", href, base, e);
            None
        }
    }
}
