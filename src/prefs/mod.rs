//! User preferences and the options offered for them.
//!
//! [`PreferenceStore`] owns the current [`UserPreferences`] and the
//! [`AvailableOptions`] derived from the latest fetched batch. Preferences are
//! written back through the injected [`Storage`] on every mutation.

pub mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore, Storage, StoreError};

use crate::constants::{DEFAULT_MAX_ARTICLES, MAX_ARTICLES, MIN_ARTICLES, USER_PREFERENCES_KEY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Persisted feed restrictions and display settings.
///
/// Empty sets mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub sources: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub authors: BTreeSet<String>,
    pub auto_refresh: bool,
    /// Always within `MIN_ARTICLES..=MAX_ARTICLES`
    pub max_articles: u32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            sources: BTreeSet::new(),
            categories: BTreeSet::new(),
            authors: BTreeSet::new(),
            auto_refresh: false,
            max_articles: DEFAULT_MAX_ARTICLES,
        }
    }
}

impl UserPreferences {
    /// Replace the fields present in `update`, leaving the rest alone
    pub fn merge(&mut self, update: PreferencesUpdate) {
        if let Some(sources) = update.sources {
            self.sources = sources;
        }
        if let Some(categories) = update.categories {
            self.categories = categories;
        }
        if let Some(authors) = update.authors {
            self.authors = authors;
        }
        if let Some(auto_refresh) = update.auto_refresh {
            self.auto_refresh = auto_refresh;
        }
        if let Some(max_articles) = update.max_articles {
            self.max_articles = max_articles;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.max_articles = self.max_articles.clamp(MIN_ARTICLES, MAX_ARTICLES);
        for set in [&mut self.sources, &mut self.categories, &mut self.authors] {
            set.retain(|value| !value.trim().is_empty());
        }
    }
}

/// Partial preferences; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesUpdate {
    pub sources: Option<BTreeSet<String>>,
    pub categories: Option<BTreeSet<String>>,
    pub authors: Option<BTreeSet<String>>,
    pub auto_refresh: Option<bool>,
    pub max_articles: Option<u32>,
}

/// Selectable values seen in the latest fetched batch. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableOptions {
    pub sources: Vec<String>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
}

/// Partial [`AvailableOptions`]; `None` lists are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableOptionsUpdate {
    pub sources: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub authors: Option<Vec<String>>,
}

impl From<AvailableOptions> for AvailableOptionsUpdate {
    fn from(options: AvailableOptions) -> Self {
        Self {
            sources: Some(options.sources),
            categories: Some(options.categories),
            authors: Some(options.authors),
        }
    }
}

/// Owner of the user's preferences
pub struct PreferenceStore {
    storage: Storage,
    preferences: UserPreferences,
    available: AvailableOptions,
}

impl PreferenceStore {
    /// Load preferences from `storage`, falling back to defaults
    pub fn load(storage: Storage) -> Self {
        let mut preferences = storage.get(USER_PREFERENCES_KEY, UserPreferences::default());
        preferences.normalize();

        tracing::debug!(
            sources = preferences.sources.len(),
            categories = preferences.categories.len(),
            authors = preferences.authors.len(),
            max_articles = preferences.max_articles,
            "loaded user preferences"
        );

        Self {
            storage,
            preferences,
            available: AvailableOptions::default(),
        }
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn available_options(&self) -> &AvailableOptions {
        &self.available
    }

    /// Merge `update` into the current preferences and persist the result
    pub fn update(&mut self, update: PreferencesUpdate) -> &UserPreferences {
        self.preferences.merge(update);
        self.persist();
        &self.preferences
    }

    /// Restore and persist the defaults
    pub fn reset(&mut self) -> &UserPreferences {
        self.preferences = UserPreferences::default();
        self.persist();
        &self.preferences
    }

    pub fn update_available_options(&mut self, update: impl Into<AvailableOptionsUpdate>) {
        let update = update.into();
        if let Some(sources) = update.sources {
            self.available.sources = sources;
        }
        if let Some(categories) = update.categories {
            self.available.categories = categories;
        }
        if let Some(authors) = update.authors {
            self.available.authors = authors;
        }
    }

    fn persist(&self) {
        self.storage.set(USER_PREFERENCES_KEY, &self.preferences);
    }
}
