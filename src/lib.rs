// Re-export modules
pub mod config;
pub mod digest;
pub mod error;
pub mod page;
pub mod parsers;
pub mod results;
pub mod summary;
pub mod transports;
pub mod urls;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{FetchConfig, SummarizerConfig};
pub use error::{Error, Result};
pub use page::Page;
pub use results::{FetchResult, PageRecord};
pub use summary::{Summarizer, Summary, SummaryClient};

/// Fetch `url` with the environment's configuration.
///
/// The returned page may still have failed; check [`Page::succeeded`].
pub async fn fetch(url: &str, render_required: bool) -> Result<Page> {
    let mut page = Page::new(url);
    page.fetch(render_required).await?;
    Ok(page)
}
