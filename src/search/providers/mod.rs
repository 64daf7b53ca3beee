//! HTTP adapters for the supported news APIs.
//!
//! Every adapter follows the same shape: build one GET request from
//! [`SearchParams`](crate::search::SearchParams), send it through
//! [`fetch_body`], decode the top-level envelope strictly and each article
//! record leniently, then map records into [`Article`](crate::search::Article).

pub mod gnews;
pub mod guardian;
pub mod newsapi;
pub mod nytimes;
pub mod worldnews;

pub use gnews::GNewsProvider;
pub use guardian::GuardianProvider;
pub use newsapi::NewsApiProvider;
pub use nytimes::NyTimesProvider;
pub use worldnews::WorldNewsProvider;

use crate::search::{NewsProvider, ProviderError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Supported upstream news APIs, in dispatch order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    NewsApi,
    Guardian,
    WorldNews,
    GNews,
    NyTimes,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::NewsApi,
        ProviderKind::Guardian,
        ProviderKind::WorldNews,
        ProviderKind::GNews,
        ProviderKind::NyTimes,
    ];

    /// Identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::NewsApi => "newsapi",
            ProviderKind::Guardian => "guardian",
            ProviderKind::WorldNews => "worldnews",
            ProviderKind::GNews => "gnews",
            ProviderKind::NyTimes => "nytimes",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::NewsApi => "NewsAPI",
            ProviderKind::Guardian => "The Guardian",
            ProviderKind::WorldNews => "World News API",
            ProviderKind::GNews => "GNews",
            ProviderKind::NyTimes => "NYTimes",
        }
    }

    /// Template value written into fresh config files. A key equal to this
    /// is treated as not configured.
    pub fn placeholder_key(&self) -> &'static str {
        match self {
            ProviderKind::NewsApi => "your_newsapi_key_here",
            ProviderKind::Guardian => "your_guardian_key_here",
            ProviderKind::WorldNews => "your_worldnews_key_here",
            ProviderKind::GNews => "your_gnews_key_here",
            ProviderKind::NyTimes => "your_nytimes_key_here",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::NewsApi => "https://newsapi.org",
            ProviderKind::Guardian => "https://content.guardianapis.com",
            ProviderKind::WorldNews => "https://api.worldnewsapi.com",
            ProviderKind::GNews => "https://gnews.io",
            ProviderKind::NyTimes => "https://api.nytimes.com",
        }
    }

    /// Environment variable that overrides the configured key
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::NewsApi => "NEWSDESK_NEWSAPI_KEY",
            ProviderKind::Guardian => "NEWSDESK_GUARDIAN_KEY",
            ProviderKind::WorldNews => "NEWSDESK_WORLDNEWS_KEY",
            ProviderKind::GNews => "NEWSDESK_GNEWS_KEY",
            ProviderKind::NyTimes => "NEWSDESK_NYTIMES_KEY",
        }
    }

    /// True when `api_key` is present and not the template placeholder.
    /// This is a configuration check only; nothing is sent over the network.
    pub fn accepts_key(&self, api_key: &str) -> bool {
        let key = api_key.trim();
        !key.is_empty() && key != self.placeholder_key()
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown news provider: {}", s))
    }
}

/// Construct the adapter for `kind`
pub fn build_provider(
    kind: ProviderKind,
    client: Client,
    api_key: &str,
    api_base: Option<&str>,
) -> Arc<dyn NewsProvider> {
    let base = api_base.unwrap_or(kind.default_base_url());
    match kind {
        ProviderKind::NewsApi => Arc::new(NewsApiProvider::new(client, api_key).with_base_url(base)),
        ProviderKind::Guardian => Arc::new(GuardianProvider::new(client, api_key).with_base_url(base)),
        ProviderKind::WorldNews => Arc::new(WorldNewsProvider::new(client, api_key).with_base_url(base)),
        ProviderKind::GNews => Arc::new(GNewsProvider::new(client, api_key).with_base_url(base)),
        ProviderKind::NyTimes => Arc::new(NyTimesProvider::new(client, api_key).with_base_url(base)),
    }
}

/// Shared HTTP client for all adapters. No timeout unless one is configured.
pub fn http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Join a base URL and endpoint path, then append the non-empty query pairs.
pub(crate) fn endpoint_url(
    base: &str,
    path: &str,
    pairs: &[(&str, Option<String>)],
) -> Result<Url, ProviderError> {
    let mut url = Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))?;
    {
        let mut query = url.query_pairs_mut();
        for (name, value) in pairs {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                query.append_pair(name, value);
            }
        }
    }
    Ok(url)
}

/// Send one GET and return the body of a successful response.
pub(crate) async fn fetch_body(
    client: &Client,
    url: Url,
    provider: &str,
) -> Result<String, ProviderError> {
    tracing::debug!(
        provider = %provider,
        url = %crate::logging::redact_secrets(url.as_str()),
        "news provider request"
    );

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = crate::logging::redact_secrets(&response.text().await.unwrap_or_default());

        tracing::warn!(
            provider = %provider,
            status = %status,
            error = %body,
            "news provider returned error status"
        );

        return Err(ProviderError::Http {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.text().await?)
}

/// Decode article records one at a time. Records that are not objects are
/// skipped so one bad entry cannot sink the whole response.
pub(crate) fn decode_records<T: DeserializeOwned>(
    provider: &str,
    records: Vec<serde_json::Value>,
) -> Vec<(usize, T)> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| match serde_json::from_value::<T>(record) {
            Ok(decoded) => Some((idx, decoded)),
            Err(e) => {
                tracing::debug!(provider = %provider, index = idx, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Deserialize a string field, mapping wrong types and blank strings to `None`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Nested `{ "name": ... }` objects (NewsAPI and GNews `source`)
#[derive(Debug, Default, Deserialize)]
pub(crate) struct NamedSource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// Deserialize an optional nested object, mapping anything unexpected to `None`.
pub(crate) fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_keys_are_rejected() {
        for kind in ProviderKind::ALL {
            assert!(!kind.accepts_key(kind.placeholder_key()));
            assert!(!kind.accepts_key(""));
            assert!(!kind.accepts_key("   "));
            assert!(kind.accepts_key("a1b2c3"));
        }
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("GNews".parse::<ProviderKind>().unwrap(), ProviderKind::GNews);
        assert_eq!(" nytimes ".parse::<ProviderKind>().unwrap(), ProviderKind::NyTimes);
        assert!("bbc".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_endpoint_url_skips_empty_values() {
        let url = endpoint_url(
            "https://example.com/",
            "/search",
            &[
                ("q", Some("rust lang".to_string())),
                ("from", Some(String::new())),
                ("to", None),
            ],
        )
        .unwrap();

        assert_eq!(url.as_str(), "https://example.com/search?q=rust+lang");
    }

    #[test]
    fn test_decode_records_skips_non_objects() {
        #[derive(Deserialize)]
        struct Record {
            #[serde(default, deserialize_with = "lenient_string")]
            title: Option<String>,
        }

        let records = vec![
            serde_json::json!({"title": "first"}),
            serde_json::json!("not an object"),
            serde_json::json!({"title": 42}),
        ];

        let decoded: Vec<(usize, Record)> = decode_records("test", records);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, 0);
        assert_eq!(decoded[0].1.title.as_deref(), Some("first"));
        assert_eq!(decoded[1].0, 2);
        assert!(decoded[1].1.title.is_none());
    }
}
