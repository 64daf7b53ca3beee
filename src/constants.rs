use std::time::Duration;

/// Storage key the user preferences are persisted under.
pub const USER_PREFERENCES_KEY: &str = "userPreferences";

pub const MIN_ARTICLES: u32 = 5;
pub const MAX_ARTICLES: u32 = 50;
pub const DEFAULT_MAX_ARTICLES: u32 = 20;

/// Period between automatic refreshes when auto-refresh is enabled.
pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

// User-facing messages. Provider error details never go into these.
pub const API_KEYS_MISSING: &str =
    "No API keys configured. Please add your API keys to the config file.";
pub const FETCH_FAILED: &str = "Failed to fetch articles. Please try again.";
pub const NO_ARTICLES: &str = "No articles found. Try adjusting your search criteria.";
pub const NO_PREFERENCES_MATCH: &str =
    "No articles match your current preferences. Try adjusting your filters.";
pub const INVALID_DATE: &str = "Invalid Date";
