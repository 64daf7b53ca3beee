use crate::search::providers::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-request HTTP timeout. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Directory holding persisted preferences (default: `~/.config/newsdesk/store`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_dir: Option<String>,

    /// Enable debug logging to file
    #[serde(default)]
    pub debug: bool,

    /// Optional debug log file path (supports `~/`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_path: Option<String>,

    /// Debug log rotation strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_rotation: Option<DebugLogRotation>,

    /// How many rotated debug logs to keep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_log_keep: Option<usize>,

    /// Upstream news API credentials
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Extra classifier keywords, merged into the built-in categories
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub category_keywords: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            preferences_dir: None,
            debug: false,
            debug_log_path: None,
            debug_log_rotation: None,
            debug_log_keep: None,
            providers: ProvidersConfig::default(),
            category_keywords: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Resolved preferences directory, if one is configured
    pub fn preferences_dir(&self) -> Option<PathBuf> {
        self.preferences_dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(|dir| PathBuf::from(super::expand_tilde(dir)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebugLogRotation {
    None,
    Daily,
    Session,
}

/// Credentials for one news API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: String,

    /// Optional custom API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderSettings {
    fn placeholder(kind: ProviderKind) -> Self {
        Self {
            api_key: kind.placeholder_key().to_string(),
            api_base: None,
        }
    }

    pub fn api_base(&self) -> Option<&str> {
        self.api_base
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
    }
}

/// One `[providers.<name>]` table per supported API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvidersConfig {
    #[serde(default = "default_newsapi")]
    pub newsapi: ProviderSettings,
    #[serde(default = "default_guardian")]
    pub guardian: ProviderSettings,
    #[serde(default = "default_worldnews")]
    pub worldnews: ProviderSettings,
    #[serde(default = "default_gnews")]
    pub gnews: ProviderSettings,
    #[serde(default = "default_nytimes")]
    pub nytimes: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            newsapi: default_newsapi(),
            guardian: default_guardian(),
            worldnews: default_worldnews(),
            gnews: default_gnews(),
            nytimes: default_nytimes(),
        }
    }
}

impl ProvidersConfig {
    /// Config with every key empty, as opposed to the placeholder template
    pub fn empty() -> Self {
        Self {
            newsapi: ProviderSettings::default(),
            guardian: ProviderSettings::default(),
            worldnews: ProviderSettings::default(),
            gnews: ProviderSettings::default(),
            nytimes: ProviderSettings::default(),
        }
    }

    pub fn get(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::NewsApi => &self.newsapi,
            ProviderKind::Guardian => &self.guardian,
            ProviderKind::WorldNews => &self.worldnews,
            ProviderKind::GNews => &self.gnews,
            ProviderKind::NyTimes => &self.nytimes,
        }
    }

    pub fn get_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::NewsApi => &mut self.newsapi,
            ProviderKind::Guardian => &mut self.guardian,
            ProviderKind::WorldNews => &mut self.worldnews,
            ProviderKind::GNews => &mut self.gnews,
            ProviderKind::NyTimes => &mut self.nytimes,
        }
    }

    /// Set the key for `kind`, keeping any custom base URL
    pub fn with_key(mut self, kind: ProviderKind, api_key: impl Into<String>) -> Self {
        self.get_mut(kind).api_key = api_key.into();
        self
    }

    /// Providers whose key passes the availability check, in dispatch order
    pub fn configured(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| kind.accepts_key(&self.get(*kind).api_key))
    }
}

fn default_newsapi() -> ProviderSettings {
    ProviderSettings::placeholder(ProviderKind::NewsApi)
}

fn default_guardian() -> ProviderSettings {
    ProviderSettings::placeholder(ProviderKind::Guardian)
}

fn default_worldnews() -> ProviderSettings {
    ProviderSettings::placeholder(ProviderKind::WorldNews)
}

fn default_gnews() -> ProviderSettings {
    ProviderSettings::placeholder(ProviderKind::GNews)
}

fn default_nytimes() -> ProviderSettings {
    ProviderSettings::placeholder(ProviderKind::NyTimes)
}
