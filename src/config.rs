use crate::error::Result;
use crate::urls::UrlPatternsConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the rendering-proxy credential
pub const RENDERING_API_KEY_VAR: &str = "SCRAPINGBEE_API_KEY";

/// Configuration for fetching a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Credential for the rendering proxy; when set, the proxy transport is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendering_api_key: Option<String>,

    /// Endpoint of the rendering proxy
    #[serde(default = "default_rendering_endpoint")]
    pub rendering_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of redirects followed by the direct transport
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User-Agent header sent by the direct transport
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Ask the rendering proxy for a screenshot as well
    #[serde(default)]
    pub screenshot: bool,

    /// URL heuristics used by extraction
    #[serde(default)]
    pub url_patterns: UrlPatternsConfig,
}

/// Configuration for the summarizer boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Byte budget for sanitized HTML handed to the summarizer
    #[serde(default = "default_max_html_bytes")]
    pub max_html_bytes: usize,

    /// How many times a timed-out summarizer call is attempted
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl FetchConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Default configuration, with the proxy credential taken from the environment
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Override settings with values from the environment when present
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(RENDERING_API_KEY_VAR) {
            if !key.trim().is_empty() {
                self.rendering_api_key = Some(key);
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            rendering_api_key: None,
            rendering_endpoint: default_rendering_endpoint(),
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            screenshot: false,
            url_patterns: UrlPatternsConfig::default(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_html_bytes: default_max_html_bytes(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_rendering_endpoint() -> String {
    "https://app.scrapingbee.com/api/v1/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    3
}

fn default_user_agent() -> String {
    concat!("page-digest/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_html_bytes() -> usize {
    32768
}

fn default_max_attempts() -> usize {
    3
}
