use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::results::FetchResult;
use crate::transports::{FetchParams, Transport};
use crate::utils::scalar_to_string;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use url::Url;

/// Viewport used when the proxy is asked for a screenshot
const SCREENSHOT_WIDTH: u32 = 1680;
const SCREENSHOT_HEIGHT: u32 = 1050;

/// Third-party proxy that can execute page scripts before returning HTML
pub struct RenderingTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout_ms: u64,
    screenshot: bool,
}

impl RenderingTransport {
    /// Fails with a validation error when no credential is configured
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let api_key = config
            .rendering_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Validation("No rendering proxy API key".to_string()))?
            .to_string();

        // The proxy enforces `timeout_ms` itself; leave it some slack on our side
        let client = Client::builder()
            .timeout(config.timeout() * 2)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.rendering_endpoint.clone(),
            api_key,
            timeout_ms: config.timeout_secs * 1000,
            screenshot: config.screenshot,
        })
    }

    /// Build the proxy request URL for `url`
    pub fn request_url(&self, url: &str, params: &FetchParams) -> Result<Url> {
        let mut query = vec![
            ("api_key", self.api_key.clone()),
            ("url", url.to_string()),
            ("return_page_source", "true".to_string()),
            ("json_response", "true".to_string()),
            ("render_js", params.render_required.to_string()),
            ("timeout", self.timeout_ms.to_string()),
        ];

        if params.screenshot || self.screenshot {
            query.push(("screenshot", "true".to_string()));
            query.push(("window_width", SCREENSHOT_WIDTH.to_string()));
            query.push(("window_height", SCREENSHOT_HEIGHT.to_string()));
        }

        Url::parse_with_params(&self.endpoint, &query)
            .map_err(|e| Error::Validation(format!("invalid rendering endpoint: {e}")))
    }
}

#[async_trait]
impl Transport for RenderingTransport {
    fn name(&self) -> &'static str {
        "rendering"
    }

    async fn request(&self, url: &str, params: &FetchParams) -> Result<FetchResult> {
        let request_url = self.request_url(url, params)?;
        ::log::debug!(
            "Requesting {} through rendering proxy (render_js={})",
            url,
            params.render_required
        );

        let response = self.client.get(request_url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        parse_response(status, &body)
    }
}

/// Turn a proxy response into a result.
///
/// A `200` whose body is a JSON object is a success; anything else is a
/// failure carrying the body as its text.
pub fn parse_response(status: StatusCode, body: &str) -> Result<FetchResult> {
    if status != StatusCode::OK || !body.starts_with('{') {
        return Ok(FetchResult::failure(status.as_u16(), body));
    }

    let payload: Map<String, Value> = serde_json::from_str(body)?;
    let mut result = FetchResult::success(status.as_u16(), string_field(&payload, "body"));

    if let Some(Value::Object(headers)) = payload.get("headers") {
        result.headers = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), scalar_to_string(value)))
            .collect();
    }
    result.content_type = optional_string(&payload, "type");
    result.resolved_url = optional_string(&payload, "resolved-url");
    result.cost = payload.get("cost").and_then(Value::as_f64);
    result.initial_status_code = payload
        .get("initial-status-code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok());
    if let Some(Value::Object(metadata)) = payload.get("metadata") {
        result.metadata = Some(metadata.clone());
    }

    Ok(result)
}

fn string_field(payload: &Map<String, Value>, key: &str) -> String {
    optional_string(payload, key).unwrap_or_default()
}

fn optional_string(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(scalar_to_string(value)),
    }
}
