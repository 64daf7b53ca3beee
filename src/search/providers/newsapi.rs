use super::{decode_records, endpoint_url, fetch_body, lenient_object, lenient_string, NamedSource};
use crate::search::{Article, NewsProvider, ProviderError, SearchParams};
use serde::Deserialize;

const ENDPOINT: &str = "/v2/everything";
const SOURCE_NAME: &str = "NewsAPI";

/// NewsAPI `/v2/everything` provider
///
/// The endpoint has no category parameter, so a requested category is
/// appended to the query text and results still go through the keyword
/// classifier.
/// Documentation: https://newsapi.org/docs/endpoints/everything
pub struct NewsApiProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl NewsApiProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_base: super::ProviderKind::NewsApi.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn search_query(params: &SearchParams) -> String {
        let query = params.query().unwrap_or("news");
        match params.category_or_section() {
            Some(category) => format!("{} {}", query, category),
            None => query.to_string(),
        }
    }

    pub(crate) fn request_url(&self, params: &SearchParams) -> Result<url::Url, ProviderError> {
        endpoint_url(
            &self.api_base,
            ENDPOINT,
            &[
                ("apiKey", Some(self.api_key.clone())),
                ("q", Some(Self::search_query(params))),
                ("from", params.from_date().map(str::to_string)),
                ("to", params.to_date().map(str::to_string)),
                ("sources", params.sources_filter().map(str::to_string)),
            ],
        )
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
    #[serde(default)]
    articles: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default, deserialize_with = "lenient_object")]
    source: Option<NamedSource>,
    #[serde(default, deserialize_with = "lenient_string")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url_to_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    published_at: Option<String>,
}

/// Map a NewsAPI response body into canonical articles
pub(crate) fn map_response(body: &str, category: Option<&str>) -> Result<Vec<Article>, ProviderError> {
    let response: EverythingResponse = serde_json::from_str(body)?;

    if response.status.as_deref() == Some("error") {
        return Err(ProviderError::Api(
            response.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

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
            image_url: raw.url_to_image,
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
impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(params)?;
        let body = fetch_body(&self.client, url, SOURCE_NAME).await?;
        let articles = map_response(&body, params.category_or_section())?;

        tracing::debug!(provider = SOURCE_NAME, count = articles.len(), "newsapi fetch completed");
        Ok(articles)
    }
}
