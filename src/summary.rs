//! Structured page summaries produced by an external language model.
//!
//! The model itself sits behind [`Summarizer`]; this module builds the
//! prompts from a fetched [`Page`], retries timeouts and parses the reply.

use crate::config::SummarizerConfig;
use crate::error::{Error, Result};
use crate::page::Page;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const SUMMARY_KEYS: &str = "\
- url
- site_name (the broad name of the site, if any)
- type (e.g. article, website, error)
- title (a string, preferably in Title Case)
- description
- author (a string, or an array of strings for several authors)
- published_at (ISO 8601)
- tags (an array of lowercase single-word tags, kebab-case allowed)
Leave out every key whose value would be empty.";

const METADATA_PROMPT: &str = "Summarize the page described by the extracted metadata below \
as a JSON object with these keys:";

const HTML_PROMPT: &str = "Summarize the page whose cleaned HTML follows \
as a JSON object with these keys:";

const RECONCILE_PROMPT: &str = "Two JSON summaries of the same page follow, each written \
independently. Merge them into the single most accurate JSON object with these keys:";

/// Model quality requested for a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Cheap model for the single-source summaries
    Fast,
    /// Stronger model for reconciling summaries
    Thorough,
}

/// A language model that answers with a JSON object
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Return the model's reply parsed as JSON.
    ///
    /// Implementations report read timeouts as [`Error::SummarizerTimeout`]
    /// so they can be retried.
    async fn complete_json(&self, system: &str, prompt: &str, tier: ModelTier) -> Result<Value>;
}

/// One author or several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authors {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Authors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Summary {
    /// Parse a model reply, ignoring unknown keys and empty values
    pub fn from_value(value: Value) -> Result<Self> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(Error::Summarizer(format!(
                    "expected a JSON object, got {other}"
                )));
            }
        };

        let fields: Map<String, Value> = fields
            .into_iter()
            .filter_map(|(key, value)| prune(value).map(|value| (key, value)))
            .collect();
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Drop blank strings, nulls and empty arrays, recursively within arrays
fn prune(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()))
        }
        Value::Array(items) => {
            let items: Vec<Value> = items.into_iter().filter_map(prune).collect();
            (!items.is_empty()).then_some(Value::Array(items))
        }
        other => Some(other),
    }
}

/// Builds prompts from a page and drives a [`Summarizer`]
pub struct SummaryClient<S> {
    summarizer: S,
    config: SummarizerConfig,
}

impl<S: Summarizer> SummaryClient<S> {
    pub fn new(summarizer: S) -> Self {
        Self::with_config(summarizer, SummarizerConfig::default())
    }

    pub fn with_config(summarizer: S, config: SummarizerConfig) -> Self {
        Self { summarizer, config }
    }

    pub fn summarizer(&self) -> &S {
        &self.summarizer
    }

    /// Summary from the page's [`Page::overview`]
    pub async fn summarize_metadata(&self, page: &Page) -> Result<Summary> {
        let overview = page.overview()?;
        self.complete(&system_prompt(METADATA_PROMPT), &overview, ModelTier::Fast)
            .await
    }

    /// Summary from the page's sanitized HTML
    pub async fn summarize_html(&self, page: &Page) -> Result<Summary> {
        let html = page.clean_html(Some(self.config.max_html_bytes))?;
        self.complete(&system_prompt(HTML_PROMPT), &html, ModelTier::Fast)
            .await
    }

    /// Reconcile the metadata and HTML summaries with the thorough model
    pub async fn summarize(&self, page: &Page) -> Result<Summary> {
        let from_metadata = self.summarize_metadata(page).await?;
        let from_html = self.summarize_html(page).await?;
        let prompt = format!(
            "{}\n\n{}",
            serde_json::to_string(&from_metadata)?,
            serde_json::to_string(&from_html)?
        );
        self.complete(&system_prompt(RECONCILE_PROMPT), &prompt, ModelTier::Thorough)
            .await
    }

    async fn complete(&self, system: &str, prompt: &str, tier: ModelTier) -> Result<Summary> {
        for attempt in 1..=self.config.max_attempts {
            match self.summarizer.complete_json(system, prompt, tier).await {
                Ok(reply) => return Summary::from_value(reply),
                Err(Error::SummarizerTimeout) => {
                    ::log::warn!(
                        "Summarizer timed out (attempt {}/{})",
                        attempt,
                        self.config.max_attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        ::log::warn!("Summarizer gave no answer, returning an empty summary");
        Ok(Summary::default())
    }
}

fn system_prompt(lead: &str) -> String {
    format!("{lead}\n{SUMMARY_KEYS}")
}
