pub mod html;
pub mod sanitize;
pub mod text;

#[cfg(test)]
mod tests;

use crate::results::FetchResult;
use scraper::Html;

/// How a fetched body should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// An HTML document worth parsing
    Html,
    /// HTML content type but nothing in the body
    Empty,
    /// Any other content type
    Other,
}

impl ContentKind {
    /// Classify a fetch result by its content type label and body
    pub fn from_fetch(result: &FetchResult) -> Self {
        if !result.is_html() {
            ::log::debug!(
                "Classifying as Other: content type {:?}",
                result.content_type
            );
            ContentKind::Other
        } else if result.body.trim().is_empty() {
            ::log::debug!("Classifying as Empty: HTML with an empty body");
            ContentKind::Empty
        } else {
            ContentKind::Html
        }
    }

    /// Returns if a DOM should be built for this content
    pub fn should_parse(&self) -> bool {
        matches!(self, ContentKind::Html)
    }
}

/// Parse the body of `result` into a document when it is non-empty HTML
pub fn load_document(result: &FetchResult) -> Option<Html> {
    if !ContentKind::from_fetch(result).should_parse() {
        return None;
    }

    let document = Html::parse_document(&result.body);
    if !document.errors.is_empty() {
        ::log::trace!("HTML parser reported {} errors", document.errors.len());
    }
    Some(document)
}
