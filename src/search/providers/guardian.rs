use super::{decode_records, endpoint_url, fetch_body, lenient_object, lenient_string};
use crate::search::{Article, NewsProvider, ProviderError, SearchParams};
use serde::Deserialize;

const ENDPOINT: &str = "/search";
const SOURCE_NAME: &str = "The Guardian";
const SHOW_FIELDS: &str = "headline,trailText,thumbnail,byline";

/// The Guardian Open Platform content search
///
/// Categories map onto Guardian sections, so filtering happens upstream.
/// Documentation: https://open-platform.theguardian.com/documentation/search
pub struct GuardianProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GuardianProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            api_base: super::ProviderKind::Guardian.default_base_url().to_string(),
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
                ("q", Some(params.query().unwrap_or("news").to_string())),
                ("from-date", params.from_date().map(str::to_string)),
                ("to-date", params.to_date().map(str::to_string)),
                ("section", params.section_or_category().map(str::to_string)),
                ("show-fields", Some(SHOW_FIELDS.to_string())),
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
    #[serde(default, deserialize_with = "lenient_string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
    #[serde(default)]
    results: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    section_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    web_publication_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    web_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    web_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    fields: Option<RawFields>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFields {
    #[serde(default, deserialize_with = "lenient_string")]
    trail_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    thumbnail: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    byline: Option<String>,
}

pub(crate) fn map_response(body: &str) -> Result<Vec<Article>, ProviderError> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;

    let Some(response) = envelope.response else {
        tracing::warn!(provider = SOURCE_NAME, "no response object in body");
        return Ok(Vec::new());
    };

    if response.status.as_deref() == Some("error") {
        return Err(ProviderError::Api(
            response.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let Some(records) = response.results else {
        tracing::warn!(provider = SOURCE_NAME, "no results in response");
        return Ok(Vec::new());
    };

    Ok(decode_records::<RawResult>(SOURCE_NAME, records)
        .into_iter()
        .map(|(idx, raw)| {
            let fields = raw.fields.unwrap_or_default();
            Article {
                id: raw.id.unwrap_or_else(|| idx.to_string()),
                title: raw.web_title.unwrap_or_default(),
                description: fields.trail_text.unwrap_or_default(),
                url: raw.web_url.unwrap_or_default(),
                image_url: fields.thumbnail,
                source: SOURCE_NAME.to_string(),
                author: fields.byline,
                published_at: raw.web_publication_date.unwrap_or_default(),
                category: raw.section_name,
            }
        })
        .collect())
}

#[async_trait::async_trait]
impl NewsProvider for GuardianProvider {
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

        tracing::debug!(provider = SOURCE_NAME, count = articles.len(), "guardian fetch completed");
        Ok(articles)
    }
}
