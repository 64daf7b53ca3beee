use super::{decode_records, endpoint_url, fetch_body, lenient_object, lenient_string, NamedSource};
use crate::search::{Article, NewsProvider, ProviderError, SearchParams};
use serde::Deserialize;

const ENDPOINT: &str = "/api/v4/top-headlines";
const SOURCE_NAME: &str = "GNews";
const DEFAULT_TOPIC: &str = "general";

/// Topics the top-headlines endpoint accepts as `category`
const TOPICS: &[&str] = &[
    "general",
    "world",
    "nation",
    "business",
    "technology",
    "entertainment",
    "sports",
    "science",
    "health",
];

/// GNews top-headlines provider
///
/// Documentation: https://gnews.io/docs/v4#top-headlines-endpoint
pub struct GNewsProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

/// How the request selects articles: a topic or a search phrase
#[derive(Debug, PartialEq, Eq)]
enum Selector {
    Topic(String),
    Query(String),
}

impl GNewsProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_base: super::ProviderKind::GNews.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// A query that names a topic is sent as the topic; otherwise the query
    /// wins, and without one the requested category (or `general`) is used.
    fn selector(params: &SearchParams) -> Selector {
        match params.query() {
            Some(q) if TOPICS.contains(&q.to_lowercase().as_str()) => Selector::Topic(q.to_lowercase()),
            Some(q) => Selector::Query(q.to_string()),
            None => Selector::Topic(
                params
                    .category_or_section()
                    .unwrap_or(DEFAULT_TOPIC)
                    .to_string(),
            ),
        }
    }

    fn iso_bound(raw: Option<&str>, name: &str) -> Option<String> {
        let raw = raw?;
        let converted = crate::dates::to_iso_instant(raw);
        if converted.is_none() {
            tracing::warn!(provider = SOURCE_NAME, param = name, value = raw, "dropping unparseable date bound");
        }
        converted
    }

    pub(crate) fn request_url(&self, params: &SearchParams) -> Result<url::Url, ProviderError> {
        let (category, q) = match Self::selector(params) {
            Selector::Topic(topic) => (Some(topic), None),
            Selector::Query(q) => (None, Some(q)),
        };

        endpoint_url(
            &self.api_base,
            ENDPOINT,
            &[
                ("apikey", Some(self.api_key.clone())),
                ("lang", Some("en".to_string())),
                ("category", category),
                ("q", q),
                ("from", Self::iso_bound(params.from_date(), "from")),
                ("to", Self::iso_bound(params.to_date(), "to")),
            ],
        )
    }
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    source: Option<NamedSource>,
}

pub(crate) fn map_response(body: &str, category: Option<&str>) -> Result<Vec<Article>, ProviderError> {
    let response: HeadlinesResponse = serde_json::from_str(body)?;

    let Some(records) = response.articles else {
        tracing::warn!(provider = SOURCE_NAME, "no articles in response");
        return Ok(Vec::new());
    };

    Ok(decode_records::<RawArticle>(SOURCE_NAME, records)
        .into_iter()
        .map(|(idx, raw)| Article {
            id: raw.url.clone().unwrap_or_else(|| idx.to_string()),
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            image_url: raw.image,
            source: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| SOURCE_NAME.to_string()),
            author: raw.author,
            published_at: raw.published_at.unwrap_or_default(),
            category: category.map(str::to_string),
        })
        .collect())
}

#[async_trait::async_trait]
impl NewsProvider for GNewsProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn filters_category_natively(&self) -> bool {
        true
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(params)?;
        let body = fetch_body(&self.client, url, SOURCE_NAME).await?;
        let category = match Self::selector(params) {
            Selector::Topic(topic) => Some(topic),
            Selector::Query(_) => params.category_or_section().map(str::to_string),
        };
        let articles = map_response(&body, category.as_deref())?;

        tracing::debug!(provider = SOURCE_NAME, count = articles.len(), "gnews fetch completed");
        Ok(articles)
    }
}
