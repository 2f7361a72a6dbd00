use crate::config::FetchConfig;
use crate::error::Result;
use crate::results::FetchResult;
use crate::transports::{FetchParams, Transport};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, redirect};

/// Plain HTTP GET against the target site
pub struct DirectTransport {
    client: Client,
}

impl DirectTransport {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for DirectTransport {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn request(&self, url: &str, params: &FetchParams) -> Result<FetchResult> {
        if params.render_required {
            ::log::debug!("Direct transport cannot render scripts, fetching {} as-is", url);
        }

        let worker_start = std::time::Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        let resolved_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;

        ::log::debug!(
            "Fetched {} ({}) in {:.2} seconds",
            url,
            status,
            worker_start.elapsed().as_secs_f64()
        );

        let mut result = if status == StatusCode::OK {
            FetchResult::success(status.as_u16(), body)
        } else {
            let text = if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body
            };
            FetchResult::failure(status.as_u16(), text)
        };
        result.headers = headers;
        result.resolved_url = Some(resolved_url);

        Ok(result)
    }
}
