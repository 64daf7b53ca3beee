//! Keyword heuristic that decides whether an article belongs to a category.
//!
//! Used only for providers whose upstream API cannot filter by category.
//! Matching is a plain lowercase substring test against `title + description`,
//! so "ai" also matches "said". That imprecision is accepted.

use crate::search::Article;
use std::collections::BTreeMap;

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "sports",
        &[
            "sport", "football", "basketball", "tennis", "soccer", "baseball", "hockey", "olympics",
            "championship", "league", "team", "player", "coach", "game", "match", "tournament",
        ],
    ),
    (
        "technology",
        &[
            "tech", "technology", "software", "hardware", "ai", "artificial intelligence",
            "machine learning", "cybersecurity", "startup", "app", "digital", "innovation",
        ],
    ),
    (
        "business",
        &[
            "business", "economy", "finance", "market", "stock", "investment", "company",
            "corporate", "trade", "economic", "financial",
        ],
    ),
    (
        "politics",
        &[
            "politics", "political", "government", "election", "congress", "senate", "president",
            "policy", "democrat", "republican", "vote",
        ],
    ),
    (
        "entertainment",
        &[
            "entertainment", "movie", "film", "music", "celebrity", "hollywood", "actor", "actress",
            "director", "album", "concert", "award",
        ],
    ),
    (
        "science",
        &[
            "science", "scientific", "research", "study", "discovery", "experiment", "laboratory",
            "scientist", "medical", "health", "medicine",
        ],
    ),
];

/// Category name -> lowercase keywords
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    keywords: BTreeMap<String, Vec<String>>,
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        let keywords = BUILTIN
            .iter()
            .map(|(category, words)| {
                (
                    category.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect();
        Self { keywords }
    }
}

impl CategoryClassifier {
    /// Classifier with only the built-in categories
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keywords to a category, creating it if needed
    pub fn with_keywords<I, S>(mut self, category: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.keywords.entry(category.trim().to_lowercase()).or_default();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !entry.contains(&keyword) {
                entry.push(keyword);
            }
        }
        self
    }

    /// Built-ins extended by a `category -> keywords` table
    pub fn with_extra(extra: &BTreeMap<String, Vec<String>>) -> Self {
        extra
            .iter()
            .fold(Self::default(), |classifier, (category, words)| {
                classifier.with_keywords(category, words)
            })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.keywords.keys().map(String::as_str)
    }

    /// True if any keyword of `category` occurs in the article's title or
    /// description. Unknown categories match nothing.
    pub fn matches(&self, article: &Article, category: &str) -> bool {
        let Some(keywords) = self.keywords.get(&category.trim().to_lowercase()) else {
            return false;
        };

        let haystack = format!("{} {}", article.title, article.description).to_lowercase();
        keywords.iter().any(|keyword| haystack.contains(keyword.as_str()))
    }

    /// Keep only the articles that match `category`
    pub fn retain_matching(&self, articles: Vec<Article>, category: &str) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|article| self.matches(article, category))
            .collect()
    }
}
