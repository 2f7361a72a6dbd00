use thiserror::Error;

/// Errors surfaced by the fetch, extraction and summary layers.
///
/// Transport faults are normally converted into a failed
/// [`FetchResult`](crate::results::FetchResult) before they reach a caller;
/// `Http` only escapes from the raw
/// [`Transport`](crate::transports::Transport) implementations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or empty URL, missing provider credential
    #[error("invalid request: {0}")]
    Validation(String),

    /// A derived field was requested before a successful fetch
    #[error("no data available: page has not been fetched successfully")]
    NoDataAvailable,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured URL pattern does not compile
    #[error("invalid URL pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The summarizer did not answer within its read timeout
    #[error("summarizer timed out")]
    SummarizerTimeout,

    #[error("summarizer failed: {0}")]
    Summarizer(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
