//! Search sessions: preference filtering, stale responses and auto-refresh

mod common;

use common::{article, ids, providers, FakeProvider, Reply, TestFixture};
use newsdesk::aggregate::{FetchError, NewsAggregator};
use newsdesk::classify::CategoryClassifier;
use newsdesk::constants::{NO_ARTICLES, NO_PREFERENCES_MATCH};
use newsdesk::feed::NewsFeed;
use newsdesk::prefs::{PreferenceStore, PreferencesUpdate, Storage};
use newsdesk::search::{Article, SearchParams};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

fn feed_with(fakes: &[Arc<FakeProvider>], store: PreferenceStore) -> NewsFeed {
    let aggregator = NewsAggregator::with_providers(providers(fakes), CategoryClassifier::new());
    NewsFeed::new(aggregator, store)
}

fn ten_articles() -> Vec<Article> {
    (0..10)
        .map(|i| article(&format!("n{}", i), "Wire", &format!("2024-01-{:02}T00:00:00Z", 20 - i)))
        .collect()
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_max_articles_caps_page() {
    let provider = FakeProvider::new("wire").reply(ten_articles()).shared();
    let mut store = PreferenceStore::load(Storage::in_memory());
    store.update(PreferencesUpdate {
        max_articles: Some(5),
        ..Default::default()
    });

    let feed = feed_with(&[provider], store);
    let page = feed.search(&SearchParams::new()).await.unwrap().unwrap();

    assert_eq!(ids(&page.articles), vec!["n0", "n1", "n2", "n3", "n4"]);
    assert_eq!(page.total_fetched, 10);
    assert!(!page.filters_active);
}

#[tokio::test]
async fn test_source_preference_and_options() {
    let provider = FakeProvider::new("mixed")
        .reply(vec![
            article("1", "A", "2024-01-03T00:00:00Z"),
            article("2", "B", "2024-01-02T00:00:00Z"),
            article("3", "C", "2024-01-01T00:00:00Z"),
        ])
        .shared();
    let mut store = PreferenceStore::load(Storage::in_memory());
    store.update(PreferencesUpdate {
        sources: Some(set(&["A"])),
        ..Default::default()
    });

    let feed = feed_with(&[provider], store);
    let page = feed.search(&SearchParams::new()).await.unwrap().unwrap();

    assert_eq!(ids(&page.articles), vec!["1"]);
    assert!(page.filters_active);
    // Options come from the unfiltered batch
    assert_eq!(feed.available_options().sources, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_preference_change_refilters_without_refetch() {
    let provider = FakeProvider::new("mixed")
        .reply(vec![
            article("1", "A", "2024-01-03T00:00:00Z"),
            article("2", "B", "2024-01-02T00:00:00Z"),
        ])
        .shared();
    let feed = feed_with(&[provider.clone()], PreferenceStore::load(Storage::in_memory()));

    assert!(feed.current_page().is_none());
    feed.search(&SearchParams::new()).await.unwrap();

    feed.update_preferences(PreferencesUpdate {
        sources: Some(set(&["Z"])),
        ..Default::default()
    });
    let page = feed.current_page().unwrap();
    assert!(page.articles.is_empty());
    assert_eq!(page.empty_message(), Some(NO_PREFERENCES_MATCH));

    feed.reset_preferences();
    let page = feed.current_page().unwrap();
    assert_eq!(ids(&page.articles), vec!["1", "2"]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_empty_classified_batch_is_not_an_error() {
    let provider = FakeProvider::new("plain")
        .reply(vec![article("1", "A", "2024-01-01T00:00:00Z")])
        .shared();
    let feed = feed_with(&[provider], PreferenceStore::load(Storage::in_memory()));

    let page = feed
        .search(&SearchParams::new().with_category("politics"))
        .await
        .unwrap()
        .unwrap();
    assert!(page.articles.is_empty());
    assert_eq!(page.empty_message(), Some(NO_ARTICLES));
}

#[tokio::test]
async fn test_preferences_persist_through_feed() {
    let fixture = TestFixture::new();
    let provider = FakeProvider::new("wire").reply(ten_articles()).shared();

    let feed = feed_with(&[provider], fixture.preference_store());
    feed.update_preferences(PreferencesUpdate {
        authors: Some(set(&["Ann"])),
        ..Default::default()
    });

    let reloaded = fixture.preference_store();
    assert_eq!(reloaded.preferences().authors, set(&["Ann"]));
}

#[tokio::test(start_paused = true)]
async fn test_stale_search_is_discarded() {
    let provider = FakeProvider::new("wire")
        .reply_after(
            Duration::from_millis(500),
            Reply::Articles(vec![article("old", "Old Source", "2024-01-01T00:00:00Z")]),
        )
        .reply_after(
            Duration::from_millis(10),
            Reply::Articles(vec![article("new", "New Source", "2024-01-02T00:00:00Z")]),
        )
        .shared();
    let feed = feed_with(&[provider], PreferenceStore::load(Storage::in_memory()));
    let params = SearchParams::new();

    let (first, second) = tokio::join!(feed.search(&params), feed.search(&params));

    assert!(first.unwrap().is_none());
    let second = second.unwrap().unwrap();
    assert_eq!(ids(&second.articles), vec!["new"]);
    assert_eq!(second.request_id, 2);

    assert_eq!(feed.available_options().sources, vec!["New Source"]);
    assert_eq!(ids(&feed.current_page().unwrap().articles), vec!["new"]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_is_discarded() {
    let provider = FakeProvider::new("wire")
        .reply_after(Duration::from_millis(500), Reply::Status(503))
        .reply_after(
            Duration::from_millis(10),
            Reply::Articles(vec![article("new", "A", "2024-01-02T00:00:00Z")]),
        )
        .shared();
    let feed = feed_with(&[provider], PreferenceStore::load(Storage::in_memory()));
    let params = SearchParams::new();

    let (first, second) = tokio::join!(feed.search(&params), feed.search(&params));

    assert!(matches!(first, Ok(None)));
    assert!(second.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_auto_refresh_repeats_until_stopped() {
    let provider = FakeProvider::new("wire").reply(ten_articles()).shared();
    let mut store = PreferenceStore::load(Storage::in_memory());
    store.update(PreferencesUpdate {
        auto_refresh: Some(true),
        ..Default::default()
    });
    let feed = feed_with(&[provider.clone()], store);

    let started = tokio::time::Instant::now();
    let mut pages = 0;
    feed.auto_refresh(&SearchParams::new(), Duration::from_secs(300), |result| {
        assert!(result.unwrap().is_some());
        pages += 1;
        if pages == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .await;

    assert_eq!(pages, 3);
    assert_eq!(provider.calls(), 3);
    assert!(started.elapsed() >= Duration::from_secs(900));
}

#[tokio::test(start_paused = true)]
async fn test_auto_refresh_stops_when_preference_turns_off() {
    let provider = FakeProvider::new("wire").reply(ten_articles()).shared();
    let mut store = PreferenceStore::load(Storage::in_memory());
    store.update(PreferencesUpdate {
        auto_refresh: Some(true),
        ..Default::default()
    });
    let feed = feed_with(&[provider.clone()], store);

    feed.auto_refresh(&SearchParams::new(), Duration::from_secs(60), |_| {
        feed.update_preferences(PreferencesUpdate {
            auto_refresh: Some(false),
            ..Default::default()
        });
        ControlFlow::Continue(())
    })
    .await;

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_auto_refresh_disabled_returns_immediately() {
    let provider = FakeProvider::new("wire").reply(ten_articles()).shared();
    let feed = feed_with(&[provider.clone()], PreferenceStore::load(Storage::in_memory()));

    feed.auto_refresh(&SearchParams::new(), Duration::from_secs(60), |_| ControlFlow::Continue(()))
        .await;

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_no_providers_surfaces_configuration_error() {
    let feed = feed_with(&[], PreferenceStore::load(Storage::in_memory()));
    let err = feed.search(&SearchParams::new()).await.unwrap_err();
    assert!(matches!(err, FetchError::NoProvidersConfigured));
}
