//! Concurrent fan-out over every configured news provider.

use crate::classify::CategoryClassifier;
use crate::config::ProvidersConfig;
use crate::constants::{API_KEYS_MISSING, FETCH_FAILED};
use crate::search::providers::build_provider;
use crate::search::{Article, NewsProvider, ProviderError, SearchParams};
use futures::future::join_all;
use std::cmp::Reverse;
use std::sync::Arc;

/// A provider call that did not contribute to the merged batch
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: ProviderError,
}

/// Fatal outcomes of an aggregate fetch
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No news providers are configured")]
    NoProvidersConfigured,

    #[error("All {attempted} news providers failed or returned no articles")]
    AllProvidersFailed {
        attempted: usize,
        failures: Vec<ProviderFailure>,
    },
}

impl FetchError {
    /// Generic message safe to show to the user. Provider details stay in logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NoProvidersConfigured => API_KEYS_MISSING,
            FetchError::AllProvidersFailed { .. } => FETCH_FAILED,
        }
    }
}

pub struct NewsAggregator {
    providers: Vec<Arc<dyn NewsProvider>>,
    classifier: CategoryClassifier,
}

impl NewsAggregator {
    /// One adapter per provider whose key passes the availability check.
    /// Nothing is sent over the network here.
    pub fn from_config(
        config: &ProvidersConfig,
        client: reqwest::Client,
        classifier: CategoryClassifier,
    ) -> Self {
        let providers = config
            .configured()
            .map(|kind| {
                let settings = config.get(kind);
                build_provider(kind, client.clone(), settings.api_key.trim(), settings.api_base())
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = providers.len(), "news providers configured");

        Self::with_providers(providers, classifier)
    }

    pub fn with_providers(providers: Vec<Arc<dyn NewsProvider>>, classifier: CategoryClassifier) -> Self {
        Self { providers, classifier }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Query every provider concurrently and merge the results.
    ///
    /// All calls are awaited to completion. Failed providers are logged and
    /// dropped; the rest are concatenated in dispatch order, narrowed by the
    /// classifier where the provider could not filter the category itself,
    /// then stably sorted newest first.
    pub async fn fetch_all(&self, params: &SearchParams) -> Result<Vec<Article>, FetchError> {
        if self.providers.is_empty() {
            tracing::warn!("no news providers configured, skipping fetch");
            return Err(FetchError::NoProvidersConfigured);
        }

        let attempted = self.providers.len();
        tracing::info!(
            providers = attempted,
            query = params.query().unwrap_or(""),
            category = params.category_or_section().unwrap_or(""),
            "fetching news"
        );

        let results = join_all(self.providers.iter().map(|provider| provider.fetch(params))).await;

        let mut batches: Vec<(&Arc<dyn NewsProvider>, Vec<Article>)> = Vec::with_capacity(attempted);
        let mut failures = Vec::new();
        for (provider, result) in self.providers.iter().zip(results) {
            match result {
                Ok(articles) => {
                    tracing::debug!(provider = %provider.name(), count = articles.len(), "provider succeeded");
                    batches.push((provider, articles));
                }
                Err(error) => {
                    tracing::warn!(
                        provider = %provider.name(),
                        error = %crate::logging::redact_secrets(&error.to_string()),
                        "provider failed"
                    );
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        error,
                    });
                }
            }
        }

        let total: usize = batches.iter().map(|(_, articles)| articles.len()).sum();
        if total == 0 {
            tracing::warn!(attempted, failed = failures.len(), "no articles from any provider");
            return Err(FetchError::AllProvidersFailed { attempted, failures });
        }

        let category = params.category_or_section();
        let mut merged = Vec::with_capacity(total);
        for (provider, articles) in batches {
            match category {
                Some(category) if !provider.filters_category_natively() => {
                    let before = articles.len();
                    let kept = self.classifier.retain_matching(articles, category);
                    tracing::debug!(
                        provider = %provider.name(),
                        category = %category,
                        before,
                        after = kept.len(),
                        "classified articles"
                    );
                    merged.extend(kept);
                }
                _ => merged.extend(articles),
            }
        }

        sort_by_recency(&mut merged);

        tracing::info!(count = merged.len(), failed = failures.len(), "news fetch completed");
        Ok(merged)
    }
}

/// Stable sort, newest first. Articles without a parseable date go last.
pub fn sort_by_recency(articles: &mut [Article]) {
    articles.sort_by_cached_key(|article| Reverse(article.published_timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        name: &'static str,
        native: bool,
        result: fn() -> Result<Vec<Article>, ProviderError>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(name: &'static str, result: fn() -> Result<Vec<Article>, ProviderError>) -> Self {
            Self {
                name,
                native: false,
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl NewsProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn filters_category_natively(&self) -> bool {
            self.native
        }

        async fn fetch(&self, _params: &SearchParams) -> Result<Vec<Article>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn article(id: &str, title: &str, published_at: &str) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            url: String::new(),
            image_url: None,
            source: "Stub".to_string(),
            author: None,
            published_at: published_at.to_string(),
            category: None,
        }
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_sort_is_stable_and_puts_bad_dates_last() {
        let mut articles = vec![
            article("bad", "", "not a date"),
            article("a", "", "2024-01-01T00:00:00Z"),
            article("b", "", "2024-01-02T00:00:00Z"),
            article("a2", "", "2024-01-01T00:00:00Z"),
            article("empty", "", ""),
        ];
        sort_by_recency(&mut articles);
        assert_eq!(ids(&articles), vec!["b", "a", "a2", "bad", "empty"]);
    }

    #[tokio::test]
    async fn test_no_providers() {
        let aggregator = NewsAggregator::with_providers(vec![], CategoryClassifier::new());
        let err = aggregator.fetch_all(&SearchParams::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::NoProvidersConfigured));
        assert_eq!(err.user_message(), API_KEYS_MISSING);
    }

    #[test]
    fn test_from_config_applies_gate() {
        let config = ProvidersConfig::default()
            .with_key(crate::search::providers::ProviderKind::NyTimes, "ny")
            .with_key(crate::search::providers::ProviderKind::NewsApi, "na");
        let aggregator =
            NewsAggregator::from_config(&config, reqwest::Client::new(), CategoryClassifier::new());
        assert_eq!(aggregator.provider_names(), vec!["NewsAPI", "NYTimes"]);
    }

    #[tokio::test]
    async fn test_classifier_only_for_non_native_providers() {
        let mut native = StubProvider::new("native", || {
            Ok(vec![article("n1", "weather report", "2024-01-02T00:00:00Z")])
        });
        native.native = true;
        let plain = StubProvider::new("plain", || {
            Ok(vec![
                article("p1", "football final", "2024-01-03T00:00:00Z"),
                article("p2", "weather report", "2024-01-01T00:00:00Z"),
            ])
        });

        let aggregator = NewsAggregator::with_providers(
            vec![Arc::new(native), Arc::new(plain)],
            CategoryClassifier::new(),
        );
        let articles = aggregator
            .fetch_all(&SearchParams::new().with_category("sports"))
            .await
            .unwrap();
        assert_eq!(ids(&articles), vec!["p1", "n1"]);

        let articles = aggregator.fetch_all(&SearchParams::new()).await.unwrap();
        assert_eq!(ids(&articles), vec!["p1", "n1", "p2"]);
    }

    #[tokio::test]
    async fn test_all_failed_counts_every_provider() {
        let failing = Arc::new(StubProvider::new("failing", || {
            Err(ProviderError::Http { status: 500, body: "boom".to_string() })
        }));
        let empty = Arc::new(StubProvider::new("empty", || Ok(vec![])));

        let aggregator = NewsAggregator::with_providers(
            vec![failing.clone(), empty.clone()],
            CategoryClassifier::new(),
        );
        let err = aggregator.fetch_all(&SearchParams::new()).await.unwrap_err();

        match &err {
            FetchError::AllProvidersFailed { attempted, failures } => {
                assert_eq!(*attempted, 2);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].provider, "failing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message(), FETCH_FAILED);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(empty.calls.load(Ordering::SeqCst), 1);
    }
}
