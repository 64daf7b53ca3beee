pub mod providers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News provider abstraction - one implementation per upstream news API
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    /// Display name used in logs and failure reports
    fn name(&self) -> &str;

    /// Whether the upstream request already restricts results to the
    /// requested category. Articles from such providers skip the keyword
    /// classifier.
    fn filters_category_natively(&self) -> bool {
        false
    }

    /// Issue exactly one request for `params` and normalize the response
    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Article>, ProviderError>;
}

/// Search request shared by every provider.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Free-text query
    pub q: Option<String>,
    /// Inclusive lower date bound (`YYYY-MM-DD`)
    pub from: Option<String>,
    /// Inclusive upper date bound (`YYYY-MM-DD`)
    pub to: Option<String>,
    /// Raw source filter, passed through to providers that understand it
    pub sources: Option<String>,
    pub category: Option<String>,
    /// Section name; alias of `category` for section-based providers
    pub section: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_sources(mut self, sources: impl Into<String>) -> Self {
        self.sources = Some(sources.into());
        self
    }

    pub fn with_date_range(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    pub fn query(&self) -> Option<&str> {
        non_empty(&self.q)
    }

    pub fn from_date(&self) -> Option<&str> {
        non_empty(&self.from)
    }

    pub fn to_date(&self) -> Option<&str> {
        non_empty(&self.to)
    }

    pub fn sources_filter(&self) -> Option<&str> {
        non_empty(&self.sources)
    }

    /// Requested category, falling back to `section`
    pub fn category_or_section(&self) -> Option<&str> {
        non_empty(&self.category).or_else(|| non_empty(&self.section))
    }

    /// Requested section, falling back to `category`
    pub fn section_or_category(&self) -> Option<&str> {
        non_empty(&self.section).or_else(|| non_empty(&self.category))
    }
}

/// Canonical article every provider response is normalized into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Provider identifier; positional fallback when the provider has none
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Outlet name
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publication time as supplied by the provider
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Article {
    /// Parsed publication time, `None` when the provider value is unusable
    pub fn published_timestamp(&self) -> Option<DateTime<Utc>> {
        crate::dates::parse_timestamp(&self.published_at)
    }
}

/// Provider-related errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Provider reported an error: {0}")]
    Api(String),

    /// Transport failure. The request URL is stripped since it carries the key.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.without_url())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
