use super::{decode_records, endpoint_url, fetch_body, lenient_object, lenient_string};
use crate::search::{Article, NewsProvider, ProviderError, SearchParams};
use serde::Deserialize;

const ENDPOINT: &str = "/svc/search/v2/articlesearch.json";
const SOURCE_NAME: &str = "NYTimes";
const MEDIA_BASE: &str = "https://www.nytimes.com/";

/// New York Times Article Search provider
///
/// Documentation: https://developer.nytimes.com/docs/articlesearch-product/1/overview
pub struct NyTimesProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl NyTimesProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_base: super::ProviderKind::NyTimes.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub(crate) fn request_url(&self, params: &SearchParams) -> Result<url::Url, ProviderError> {
        endpoint_url(
            &self.api_base,
            ENDPOINT,
            &[
                ("api-key", Some(self.api_key.clone())),
                ("q", params.query().map(str::to_string)),
                (
                    "fq",
                    params
                        .section_or_category()
                        .map(|section| format!("section_name:(\"{}\")", section)),
                ),
                ("begin_date", params.from_date().and_then(crate::dates::compact_date)),
                ("end_date", params.to_date().and_then(crate::dates::compact_date)),
            ],
        )
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    response: Option<SearchBody>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    docs: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawDoc {
    #[serde(default, rename = "_id", deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    headline: Option<RawHeadline>,
    #[serde(default, rename = "abstract", deserialize_with = "lenient_string")]
    summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    web_url: Option<String>,
    #[serde(default)]
    multimedia: serde_json::Value,
    #[serde(default, deserialize_with = "lenient_object")]
    byline: Option<RawByline>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    section_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHeadline {
    #[serde(default, deserialize_with = "lenient_string")]
    main: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawByline {
    #[serde(default, deserialize_with = "lenient_string")]
    original: Option<String>,
}

/// First multimedia URL. Older responses use an array of `{url}` entries with
/// site-relative paths; newer ones an object with `default.url`.
fn image_url(multimedia: &serde_json::Value) -> Option<String> {
    let raw = match multimedia {
        serde_json::Value::Array(items) => items.first()?.get("url")?.as_str()?,
        serde_json::Value::Object(_) => multimedia.get("default")?.get("url")?.as_str()?,
        _ => return None,
    };

    if raw.trim().is_empty() {
        None
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        Some(raw.to_string())
    } else {
        Some(format!("{}{}", MEDIA_BASE, raw.trim_start_matches('/')))
    }
}

pub(crate) fn map_response(body: &str) -> Result<Vec<Article>, ProviderError> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;

    let Some(records) = envelope.response.and_then(|r| r.docs) else {
        tracing::warn!(provider = SOURCE_NAME, "no docs in response");
        return Ok(Vec::new());
    };

    Ok(decode_records::<RawDoc>(SOURCE_NAME, records)
        .into_iter()
        .map(|(idx, raw)| Article {
            id: raw.id.unwrap_or_else(|| idx.to_string()),
            title: raw.headline.and_then(|h| h.main).unwrap_or_default(),
            description: raw.summary.unwrap_or_default(),
            url: raw.web_url.unwrap_or_default(),
            image_url: image_url(&raw.multimedia),
            source: SOURCE_NAME.to_string(),
            author: raw.byline.and_then(|b| b.original),
            published_at: raw.pub_date.unwrap_or_default(),
            category: raw.section_name,
        })
        .collect())
}

#[async_trait::async_trait]
impl NewsProvider for NyTimesProvider {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn filters_category_natively(&self) -> bool {
        true
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Article>, ProviderError> {
        let url = self.request_url(params)?;
        let body = fetch_body(&self.client, url, SOURCE_NAME).await?;
        let articles = map_response(&body)?;

        tracing::debug!(provider = SOURCE_NAME, count = articles.len(), "nytimes fetch completed");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_params() {
        let provider = NyTimesProvider::new(reqwest::Client::new(), "ny").with_base_url("https://nyt.test");
        let params = SearchParams::new()
            .with_section("Arts")
            .with_date_range("2024-01-01", "2024-01-31");
        let url = provider.request_url(&params).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("fq".to_string(), "section_name:(\"Arts\")".to_string())));
        assert!(pairs.contains(&("begin_date".to_string(), "20240101".to_string())));
        assert!(pairs.contains(&("end_date".to_string(), "20240131".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "q"));
    }

    #[test]
    fn test_map_response() {
        let body = r#"{
            "status": "OK",
            "response": {
                "docs": [
                    {
                        "_id": "nyt://article/1",
                        "abstract": "An abstract",
                        "web_url": "https://www.nytimes.com/2024/01/02/arts/story.html",
                        "multimedia": [{"url": "images/2024/01/02/story.jpg"}],
                        "headline": {"main": "Arts story"},
                        "byline": {"original": "By Pat Critic"},
                        "pub_date": "2024-01-02T05:00:00+0000",
                        "section_name": "Arts"
                    },
                    {
                        "_id": "nyt://article/2",
                        "headline": {"main": "Modern shape"},
                        "multimedia": {"default": {"url": "https://static01.nyt.com/x.jpg"}},
                        "pub_date": "2024-01-01T05:00:00+0000"
                    }
                ]
            }
        }"#;

        let articles = map_response(body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Arts story");
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://www.nytimes.com/images/2024/01/02/story.jpg")
        );
        assert_eq!(articles[0].author.as_deref(), Some("By Pat Critic"));
        assert_eq!(articles[0].category.as_deref(), Some("Arts"));
        assert!(articles[0].published_timestamp().is_some());

        assert_eq!(articles[1].image_url.as_deref(), Some("https://static01.nyt.com/x.jpg"));
        assert_eq!(articles[1].description, "");
        assert!(articles[1].author.is_none());
    }

    #[test]
    fn test_missing_docs() {
        assert!(map_response(r#"{"status":"OK"}"#).unwrap().is_empty());
    }
}
