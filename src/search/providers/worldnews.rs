use super::{decode_records, endpoint_url, fetch_body, lenient_string};
use crate::search::{Article, NewsProvider, ProviderError, SearchParams};
use serde::Deserialize;

const ENDPOINT: &str = "/search-news";
const SOURCE_NAME: &str = "World News";

/// World News API `search-news` provider
///
/// Documentation: https://worldnewsapi.com/docs/search-news/
pub struct WorldNewsProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl WorldNewsProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_base: super::ProviderKind::WorldNews.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub(crate) fn request_url(&self, params: &SearchParams) -> Result<url::Url, ProviderError> {
        let query = params.query().unwrap_or("news");
        let text = match params.category_or_section() {
            Some(category) => format!("{} {}", query, category),
            None => query.to_string(),
        };

        endpoint_url(
            &self.api_base,
            ENDPOINT,
            &[
                ("api-key", Some(self.api_key.clone())),
                ("text", Some(text)),
                ("earliest-publish-date", params.from_date().map(str::to_string)),
                ("latest-publish-date", params.to_date().map(str::to_string)),
            ],
        )
    }
}

#[derive(Debug, Deserialize)]
struct SearchNewsResponse {
    #[serde(default)]
    news: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawNews {
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    source_country: Option<String>,
}

pub(crate) fn map_response(body: &str, category: Option<&str>) -> Result<Vec<Article>, ProviderError> {
    let response: SearchNewsResponse = serde_json::from_str(body)?;

    let Some(records) = response.news else {
        tracing::warn!(provider = SOURCE_NAME, "no news in response");
        return Ok(Vec::new());
    };

    Ok(decode_records::<RawNews>(SOURCE_NAME, records)
        .into_iter()
        .map(|(idx, raw)| Article {
            id: raw.url.clone().unwrap_or_else(|| format!("worldnews-{}", idx)),
            title: raw.title.unwrap_or_default(),
            description: raw.text.unwrap_or_default(),
            url: raw.url.unwrap_or_default(),
            image_url: raw.image,
            source: raw.source_country.unwrap_or_else(|| SOURCE_NAME.to_string()),
            author: raw.author,
            published_at: raw.publish_date.unwrap_or_default(),
            category: category.map(str::to_string),
        })
        .collect())
}

#[async_trait::async_trait]
impl NewsProvider for WorldNewsProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn filters_category_natively(&self) -> bool {
        true
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(params)?;
        let body = fetch_body(&self.client, url, SOURCE_NAME).await?;
        let articles = map_response(&body, params.category_or_section())?;

        tracing::debug!(provider = SOURCE_NAME, count = articles.len(), "world news fetch completed");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_params() {
        let provider = WorldNewsProvider::new(reqwest::Client::new(), "wn").with_base_url("https://wn.test");
        let url = provider
            .request_url(&SearchParams::new().with_category("science").with_date_range("2024-02-01", ""))
            .unwrap();

        assert_eq!(url.path(), "/search-news");
        assert_eq!(
            url.query(),
            Some("api-key=wn&text=news+science&earliest-publish-date=2024-02-01")
        );
    }

    #[test]
    fn test_map_response_positional_ids() {
        let body = r#"{
            "news": [
                {"title": "One", "text": "Body", "url": "https://wn.test/1", "publish_date": "2024-02-01 09:00:00", "source_country": "us"},
                {"title": "Two", "publish_date": "2024-02-01 08:00:00", "author": "Sam"}
            ]
        }"#;

        let articles = map_response(body, None).unwrap();
        assert_eq!(articles[0].id, "https://wn.test/1");
        assert_eq!(articles[0].source, "us");
        assert_eq!(articles[1].id, "worldnews-1");
        assert_eq!(articles[1].source, "World News");
        assert_eq!(articles[1].author.as_deref(), Some("Sam"));
        assert!(articles[1].published_timestamp().is_some());
    }
}
