//! Search session tying the aggregator to the user's preferences.
//!
//! Every search is tagged with an increasing request id. A search that
//! finishes after a newer one was started is discarded, so a slow response can
//! never overwrite a fresher page or its options.

use crate::aggregate::{FetchError, NewsAggregator};
use crate::constants::{NO_ARTICLES, NO_PREFERENCES_MATCH};
use crate::filter::{apply_preferences, extract_available_options, has_active_filters};
use crate::prefs::{AvailableOptions, PreferenceStore, PreferencesUpdate, UserPreferences};
use crate::search::{Article, SearchParams};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Filtered, capped result of one search
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub articles: Vec<Article>,
    /// Size of the merged batch before preference filtering
    pub total_fetched: usize,
    pub filters_active: bool,
    pub request_id: u64,
}

impl FeedPage {
    /// Message for an empty page, distinguishing "filtered out" from "nothing found"
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.articles.is_empty() {
            None
        } else if self.filters_active && self.total_fetched > 0 {
            Some(NO_PREFERENCES_MATCH)
        } else {
            Some(NO_ARTICLES)
        }
    }
}

struct Batch {
    request_id: u64,
    articles: Vec<Article>,
}

pub struct NewsFeed {
    aggregator: NewsAggregator,
    preferences: Mutex<PreferenceStore>,
    latest_request: AtomicU64,
    batch: Mutex<Option<Batch>>,
}

impl NewsFeed {
    pub fn new(aggregator: NewsAggregator, preferences: PreferenceStore) -> Self {
        Self {
            aggregator,
            preferences: Mutex::new(preferences),
            latest_request: AtomicU64::new(0),
            batch: Mutex::new(None),
        }
    }

    pub fn aggregator(&self) -> &NewsAggregator {
        &self.aggregator
    }

    fn store(&self) -> MutexGuard<'_, PreferenceStore> {
        self.preferences.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached(&self) -> MutexGuard<'_, Option<Batch>> {
        self.batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch, publish the available options, then filter and cap.
    ///
    /// Returns `Ok(None)` when a newer search was issued while this one was in
    /// flight. Errors of superseded searches are dropped the same way.
    pub async fn search(&self, params: &SearchParams) -> Result<Option<FeedPage>, FetchError> {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.aggregator.fetch_all(params).await;

        let latest = self.latest_request.load(Ordering::SeqCst);
        if latest != request_id {
            tracing::debug!(request_id, latest, "discarding stale search result");
            return Ok(None);
        }

        let articles = result?;
        let options = extract_available_options(&articles);

        let page = {
            let mut store = self.store();
            store.update_available_options(options);
            build_page(&articles, store.preferences(), request_id)
        };

        *self.cached() = Some(Batch { request_id, articles });

        Ok(Some(page))
    }

    /// Re-filter the last fetched batch with the current preferences, without
    /// refetching. `None` before the first successful search.
    pub fn current_page(&self) -> Option<FeedPage> {
        let cached = self.cached();
        let batch = cached.as_ref()?;
        let prefs = self.preferences();
        Some(build_page(&batch.articles, &prefs, batch.request_id))
    }

    pub fn preferences(&self) -> UserPreferences {
        self.store().preferences().clone()
    }

    pub fn available_options(&self) -> AvailableOptions {
        self.store().available_options().clone()
    }

    pub fn update_preferences(&self, update: PreferencesUpdate) -> UserPreferences {
        self.store().update(update).clone()
    }

    pub fn reset_preferences(&self) -> UserPreferences {
        self.store().reset().clone()
    }

    /// Repeat `params` every `period` while the stored auto-refresh preference
    /// is on. The first run happens one period from now. `on_result` receives
    /// each outcome and may stop the loop with `ControlFlow::Break`.
    pub async fn auto_refresh<F>(&self, params: &SearchParams, period: Duration, mut on_result: F)
    where
        F: FnMut(Result<Option<FeedPage>, FetchError>) -> ControlFlow<()>,
    {
        if !self.preferences().auto_refresh {
            tracing::debug!("auto-refresh disabled");
            return;
        }

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            if !self.preferences().auto_refresh {
                tracing::debug!("auto-refresh turned off, stopping");
                break;
            }

            tracing::debug!(period_secs = period.as_secs(), "auto-refresh tick");
            if on_result(self.search(params).await).is_break() {
                break;
            }
        }
    }
}

fn build_page(articles: &[Article], prefs: &UserPreferences, request_id: u64) -> FeedPage {
    FeedPage {
        articles: apply_preferences(articles.to_vec(), prefs),
        total_fetched: articles.len(),
        filters_active: has_active_filters(prefs),
        request_id,
    }
}
