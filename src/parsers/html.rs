//! Field resolvers over a parsed HTML document.
//!
//! Every multi-source resolver gathers its candidates in a fixed priority
//! order and hands them to [`dedup_trimmed`], so results are trimmed,
//! non-empty, unique and ordered by source priority.

use crate::parsers::text::word_count;
use crate::urls::{self, UrlPatterns};
use crate::utils::{dedup_trimmed, scalar_to_string};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const MAX_HEADINGS: usize = 10;
pub const MIN_HEADING_WORDS: usize = 3;
pub const MAX_PARAGRAPHS: usize = 10;
pub const MAX_PARAGRAPH_CHARS: usize = 1024;

/// OpenGraph keys that may carry a publication time, first present wins
const OPEN_GRAPH_DATE_KEYS: &[&str] = &[
    "article:published_time",
    "og:pubdate",
    "og:article:published_time",
];

static META: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta").expect("BUG: hardcoded CSS selector \"meta\" is invalid")
});

static TITLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector \"title\" is invalid")
});

static META_DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='description']")
        .expect("BUG: hardcoded CSS selector \"meta[name='description']\" is invalid")
});

static AUTHOR_CARD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".p-author").expect("BUG: hardcoded CSS selector \".p-author\" is invalid")
});

static CITATION_AUTHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[name='citation_author']")
        .expect("BUG: hardcoded CSS selector \"meta[name='citation_author']\" is invalid")
});

static AUTHOR_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[rel='author']")
        .expect("BUG: hardcoded CSS selector \"a[rel='author']\" is invalid")
});

static DATE_ELEMENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[class*='date'], [id*='date'], time[datetime]")
        .expect("BUG: hardcoded CSS selector \"[class*='date'], [id*='date'], time[datetime]\" is invalid")
});

static DATE_PUBLISHED: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("time[itemprop='datePublished']")
        .expect("BUG: hardcoded CSS selector \"time[itemprop='datePublished']\" is invalid")
});

static HEADING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3").expect("BUG: hardcoded CSS selector \"h1, h2, h3\" is invalid")
});

static ENTRY_CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".entry-content")
        .expect("BUG: hardcoded CSS selector \".entry-content\" is invalid")
});

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p").expect("BUG: hardcoded CSS selector \"p\" is invalid")
});

static RSS_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("link[type='application/rss+xml']")
        .expect("BUG: hardcoded CSS selector \"link[type='application/rss+xml']\" is invalid")
});

static ATOM_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("link[type='application/atom+xml']")
        .expect("BUG: hardcoded CSS selector \"link[type='application/atom+xml']\" is invalid")
});

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a").expect("BUG: hardcoded CSS selector \"a\" is invalid")
});

/// Inputs shared by the resolvers
pub struct FieldSources<'a> {
    pub document: &'a Html,
    pub open_graph: &'a BTreeMap<String, String>,
    pub meta_tags: &'a BTreeMap<String, String>,
    /// URL the page was requested with
    pub url: &'a str,
    /// Final URL after redirects, if known
    pub resolved_url: Option<&'a str>,
    pub patterns: &'a UrlPatterns,
}

impl FieldSources<'_> {
    /// URL relative references are resolved against
    pub fn base_url(&self) -> &str {
        self.resolved_url.unwrap_or(self.url)
    }
}

/// First element of the vendor-supplied `opengraph` array
pub fn open_graph(metadata: Option<&Map<String, Value>>) -> BTreeMap<String, String> {
    let Some(entry) = metadata
        .and_then(|metadata| metadata.get("opengraph"))
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(Value::as_object)
    else {
        return BTreeMap::new();
    };

    entry
        .iter()
        .filter(|(_, value)| matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)))
        .map(|(key, value)| (key.clone(), scalar_to_string(value)))
        .collect()
}

/// Every `<meta>` keyed by `name`, else `property`; later tags win
pub fn meta_tags(document: &Html) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    for meta in document.select(&META) {
        let element = meta.value();
        let Some(key) = element.attr("name").or_else(|| element.attr("property")) else {
            continue;
        };
        let content = element.attr("content").unwrap_or_default();
        tags.insert(key.to_string(), content.to_string());
    }
    tags
}

pub fn titles(sources: &FieldSources<'_>) -> Vec<String> {
    let candidates = [
        sources.open_graph.get("og:title").cloned(),
        select_first(sources.document, &TITLE).map(text_of),
    ];
    dedup_trimmed(candidates.into_iter().flatten())
}

pub fn descriptions(sources: &FieldSources<'_>) -> Vec<String> {
    let candidates = [
        sources.open_graph.get("og:description").cloned(),
        sources.meta_tags.get("og:description").cloned(),
        select_first(sources.document, &META_DESCRIPTION)
            .and_then(|meta| meta.value().attr("content"))
            .map(str::to_string),
    ];
    dedup_trimmed(candidates.into_iter().flatten())
}

pub fn authors(sources: &FieldSources<'_>) -> Vec<String> {
    let mut candidates = vec![
        sources.open_graph.get("article:author").cloned(),
        sources.meta_tags.get("author").cloned(),
        select_first(sources.document, &AUTHOR_CARD).map(text_of),
        select_first(sources.document, &CITATION_AUTHOR)
            .and_then(|meta| meta.value().attr("content"))
            .map(str::to_string),
    ];
    candidates.extend(
        sources
            .document
            .select(&AUTHOR_LINK)
            .map(|anchor| Some(text_of(anchor))),
    );
    dedup_trimmed(candidates.into_iter().flatten())
}

pub fn published_dates(sources: &FieldSources<'_>) -> Vec<String> {
    let candidates = [
        OPEN_GRAPH_DATE_KEYS
            .iter()
            .find_map(|key| sources.open_graph.get(*key).cloned()),
        sources.meta_tags.get("article:published_time").cloned(),
        sources
            .patterns
            .date_in_url(sources.base_url())
            .map(str::to_string),
        select_first(sources.document, &DATE_ELEMENT).map(text_of),
        select_first(sources.document, &DATE_PUBLISHED)
            .and_then(|time| time.value().attr("datetime"))
            .map(str::to_string),
    ];
    dedup_trimmed(candidates.into_iter().flatten())
}

/// `h1`-`h3` texts with at least [`MIN_HEADING_WORDS`] words
pub fn headings(sources: &FieldSources<'_>) -> Vec<String> {
    let texts = sources.document.select(&HEADING).map(text_of);

    dedup_trimmed(texts)
        .into_iter()
        .filter(|heading| word_count(heading) >= MIN_HEADING_WORDS)
        .take(MAX_HEADINGS)
        .collect()
}

/// Paragraph texts, scoped to `.entry-content` on code-hosting pages
pub fn paragraphs(sources: &FieldSources<'_>) -> Vec<String> {
    let scoped_root = if sources.patterns.is_code_hosting(sources.url) {
        let root = select_first(sources.document, &ENTRY_CONTENT);
        if root.is_none() {
            ::log::debug!("No .entry-content on {}, using the whole document", sources.url);
        }
        root
    } else {
        None
    };

    let elements: Vec<ElementRef<'_>> = match scoped_root {
        Some(root) => root.select(&PARAGRAPH).collect(),
        None => sources.document.select(&PARAGRAPH).collect(),
    };

    let texts = elements
        .into_iter()
        .map(text_of)
        .filter(|text| text.trim().chars().count() <= MAX_PARAGRAPH_CHARS);

    dedup_trimmed(texts).into_iter().take(MAX_PARAGRAPHS).collect()
}

/// RSS link, Atom link and the first feed-looking anchor, as absolute URLs
pub fn feeds(sources: &FieldSources<'_>) -> Vec<String> {
    let document = sources.document;
    let candidates = [
        select_first(document, &RSS_LINK)
            .and_then(|link| link.value().attr("href")),
        select_first(document, &ATOM_LINK)
            .and_then(|link| link.value().attr("href")),
        document
            .select(&ANCHOR)
            .filter_map(|anchor| anchor.value().attr("href"))
            .find(|href| sources.patterns.is_feed_href(href)),
    ];

    let base = sources.base_url();
    dedup_trimmed(
        candidates
            .into_iter()
            .flatten()
            .filter_map(|href| urls::resolve(base, href)),
    )
}

pub fn site_name(
    open_graph: &BTreeMap<String, String>,
    meta_tags: &BTreeMap<String, String>,
) -> Option<String> {
    first_non_blank([open_graph.get("og:site_name"), meta_tags.get("og:site_name")])
}

pub fn content_type_label(
    open_graph: &BTreeMap<String, String>,
    meta_tags: &BTreeMap<String, String>,
) -> Option<String> {
    first_non_blank([meta_tags.get("og:type"), open_graph.get("og:type")])
}

fn first_non_blank<'a>(candidates: impl IntoIterator<Item = Option<&'a String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn select_first<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
