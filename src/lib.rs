//! newsdesk library
//!
//! Multi-provider news search: concurrent fan-out to several news APIs,
//! normalization into one article shape, recency merge, and preference-based
//! filtering with persisted user preferences.

pub mod aggregate;
pub mod classify;
pub mod cli;
pub mod config;
pub mod constants;
pub mod dates;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod prefs;
pub mod search;

pub use aggregate::{FetchError, NewsAggregator};
pub use feed::{FeedPage, NewsFeed};
pub use search::{Article, NewsProvider, ProviderError, SearchParams};
