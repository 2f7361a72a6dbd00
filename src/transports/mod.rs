pub mod direct;
pub mod rendering;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::results::{FetchResult, TRANSPORT_FAILURE_STATUS};
use async_trait::async_trait;

pub use direct::DirectTransport;
pub use rendering::RenderingTransport;

/// Per-request options understood by the transports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchParams {
    /// The page needs script execution before its HTML is meaningful
    pub render_required: bool,
    /// Capture a screenshot along with the page (rendering proxy only)
    pub screenshot: bool,
}

impl FetchParams {
    pub fn rendered() -> Self {
        Self {
            render_required: true,
            ..Self::default()
        }
    }
}

/// A strategy for retrieving a page
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name recorded on every result
    fn name(&self) -> &'static str;

    /// Fetch `url`; transport faults are returned as errors
    async fn request(&self, url: &str, params: &FetchParams) -> Result<FetchResult>;
}

/// Pick the rendering proxy when a credential is configured, else fetch directly
pub fn select_transport(config: &FetchConfig) -> Result<Box<dyn Transport>> {
    match config.rendering_api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            ::log::debug!("Using rendering proxy at {}", config.rendering_endpoint);
            Ok(Box::new(RenderingTransport::new(config)?))
        }
        _ => {
            ::log::debug!("Using direct transport");
            Ok(Box::new(DirectTransport::new(config)?))
        }
    }
}

/// Validate `url`, run the transport and normalize its result.
///
/// Only validation problems are returned as `Err`. Every other fault becomes a
/// failed [`FetchResult`] with status [`TRANSPORT_FAILURE_STATUS`].
pub async fn fetch_url(
    transport: &dyn Transport,
    url: &str,
    params: &FetchParams,
) -> Result<FetchResult> {
    let url = crate::urls::validate(url)?;

    let mut result = match transport.request(url.as_str(), params).await {
        Ok(result) => result,
        Err(Error::Validation(message)) => return Err(Error::Validation(message)),
        Err(e) => {
            ::log::warn!("{} transport failed for {}: {}", transport.name(), url, e);
            FetchResult::failure(TRANSPORT_FAILURE_STATUS, e.to_string())
        }
    };

    result.transport = Some(transport.name().to_string());
    Ok(normalize(result))
}

/// Lower-case header names and derive the content type label
pub fn normalize(mut result: FetchResult) -> FetchResult {
    result.headers = std::mem::take(&mut result.headers)
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect();

    if result.content_type.is_none() {
        result.content_type = result
            .headers
            .get("content-type")
            .and_then(|value| value.split(';').next())
            .map(|media_type| media_type.trim().to_ascii_lowercase())
            .filter(|media_type| !media_type.is_empty());
    }

    if let Some(media_type) = &result.content_type {
        if media_type.starts_with("text/html") {
            result.content_type = Some("html".to_string());
        }
    }

    result
}
