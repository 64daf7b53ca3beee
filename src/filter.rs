//! Preference-based post-filtering of a fetched, sorted batch.

use crate::prefs::{AvailableOptions, UserPreferences};
use crate::search::Article;
use std::collections::BTreeSet;

/// True when any of the source, category or author restrictions is set.
/// Callers use this to tell "nothing matched your filters" apart from
/// "nothing was found".
pub fn has_active_filters(prefs: &UserPreferences) -> bool {
    !prefs.sources.is_empty() || !prefs.categories.is_empty() || !prefs.authors.is_empty()
}

fn matches_source(article: &Article, prefs: &UserPreferences) -> bool {
    prefs.sources.is_empty() || prefs.sources.contains(&article.source)
}

fn matches_category(article: &Article, prefs: &UserPreferences) -> bool {
    if prefs.categories.is_empty() {
        return true;
    }
    article
        .category
        .as_ref()
        .is_some_and(|category| prefs.categories.contains(category))
}

fn matches_author(article: &Article, prefs: &UserPreferences) -> bool {
    if prefs.authors.is_empty() {
        return true;
    }
    article
        .author
        .as_ref()
        .is_some_and(|author| prefs.authors.contains(author))
}

/// Keep articles satisfying every active restriction. An article lacking the
/// restricted field never matches. Without active restrictions the input is
/// returned untouched.
pub fn filter_by_preferences(articles: Vec<Article>, prefs: &UserPreferences) -> Vec<Article> {
    if !has_active_filters(prefs) {
        return articles;
    }

    articles
        .into_iter()
        .filter(|article| {
            matches_source(article, prefs)
                && matches_category(article, prefs)
                && matches_author(article, prefs)
        })
        .collect()
}

/// First `max_articles` entries, order unchanged
pub fn limit(mut articles: Vec<Article>, max_articles: usize) -> Vec<Article> {
    articles.truncate(max_articles);
    articles
}

/// Filter by preferences, then cap at `prefs.max_articles`
pub fn apply_preferences(articles: Vec<Article>, prefs: &UserPreferences) -> Vec<Article> {
    limit(filter_by_preferences(articles, prefs), prefs.max_articles as usize)
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct, sorted, non-empty sources/categories/authors seen in `articles`
pub fn extract_available_options(articles: &[Article]) -> AvailableOptions {
    AvailableOptions {
        sources: distinct(articles.iter().map(|a| a.source.as_str())),
        categories: distinct(articles.iter().filter_map(|a| a.category.as_deref())),
        authors: distinct(articles.iter().filter_map(|a| a.author.as_deref())),
    }
}
