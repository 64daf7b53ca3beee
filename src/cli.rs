//! Command-line front end.
//!
//! Thin layer over [`NewsFeed`]: parses arguments, loads config and
//! preferences, prints pages. All fetch and filter logic lives in the library.

use crate::aggregate::NewsAggregator;
use crate::classify::CategoryClassifier;
use crate::config::{self, Config};
use crate::constants::AUTO_REFRESH_INTERVAL;
use crate::feed::{FeedPage, NewsFeed};
use crate::prefs::{AvailableOptions, JsonFileStore, PreferenceStore, PreferencesUpdate, Storage, UserPreferences};
use crate::search::providers::{http_client, ProviderKind};
use crate::search::{Article, SearchParams};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

const WRAP_WIDTH: usize = 80;

#[derive(Parser, Debug)]
#[command(name = "newsdesk", author, version, about = "Search several news APIs at once")]
pub struct Cli {
    /// Path to config.toml (default: ~/.config/newsdesk/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch, merge and filter articles from every configured provider
    Search(SearchArgs),

    /// Show or change the stored feed preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),

    /// List providers and whether a usable key is configured
    Providers,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Free-text query
    #[arg(short, long)]
    pub query: Option<String>,

    /// Earliest publication date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<String>,

    /// Latest publication date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    /// Section, for providers organised by section
    #[arg(long)]
    pub section: Option<String>,

    /// Provider-specific source filter, passed through as given
    #[arg(long)]
    pub sources: Option<String>,

    /// Print articles as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep running and refresh while auto-refresh is enabled
    #[arg(long)]
    pub watch: bool,

    /// Also list the sources, categories and authors seen in the results
    #[arg(long)]
    pub show_options: bool,
}

impl SearchArgs {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            q: self.query.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            sources: self.sources.clone(),
            category: self.category.clone(),
            section: self.section.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    /// Print the stored preferences
    Show,

    /// Change some preferences, leaving the rest as they are
    Set(PrefsSetArgs),

    /// Restore the defaults
    Reset,
}

#[derive(Args, Debug, Default)]
pub struct PrefsSetArgs {
    /// Comma-separated sources to allow (empty string clears)
    #[arg(long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Comma-separated categories to allow (empty string clears)
    #[arg(long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Comma-separated authors to allow (empty string clears)
    #[arg(long, value_delimiter = ',')]
    pub authors: Option<Vec<String>>,

    #[arg(long)]
    pub auto_refresh: Option<bool>,

    /// Articles per page, clamped to 5..=50
    #[arg(long)]
    pub max_articles: Option<u32>,
}

impl PrefsSetArgs {
    pub fn update(self) -> PreferencesUpdate {
        fn to_set(values: Option<Vec<String>>) -> Option<BTreeSet<String>> {
            values.map(|values| values.into_iter().map(|v| v.trim().to_string()).collect())
        }

        PreferencesUpdate {
            sources: to_set(self.sources),
            categories: to_set(self.categories),
            authors: to_set(self.authors),
            auto_refresh: self.auto_refresh,
            max_articles: self.max_articles,
        }
    }
}

fn parse_date_arg(raw: &str) -> Result<String, String> {
    if crate::dates::parse_date(raw).is_some() {
        Ok(raw.trim().to_string())
    } else {
        Err(format!("invalid date '{}', expected YYYY-MM-DD", raw))
    }
}

/// Parse arguments and run the selected command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let _log_guard = if cli.verbose {
        crate::logging::init_stderr();
        None
    } else {
        crate::logging::init(&config)?
    };

    match cli.command {
        Command::Search(args) => search(&config, args).await,
        Command::Prefs(command) => prefs(&config, command),
        Command::Providers => {
            print!("{}", render_providers(&config));
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = config::load_or_create_config_at(path)?;
            config::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
            Ok(config)
        }
        None => config::load_or_create_config(),
    }
}

fn preference_store(config: &Config) -> PreferenceStore {
    let backend = match config.preferences_dir() {
        Some(dir) => JsonFileStore::with_dir(dir),
        None => JsonFileStore::new(),
    };
    tracing::debug!(dir = %backend.dir().display(), "preferences store");
    PreferenceStore::load(Storage::new(Arc::new(backend)))
}

fn build_feed(config: &Config) -> Result<NewsFeed> {
    let client = http_client(config.request_timeout()).context("Failed to build HTTP client")?;
    let classifier = CategoryClassifier::with_extra(&config.category_keywords);
    let aggregator = NewsAggregator::from_config(&config.providers, client, classifier);
    Ok(NewsFeed::new(aggregator, preference_store(config)))
}

async fn search(config: &Config, args: SearchArgs) -> Result<()> {
    let feed = build_feed(config)?;
    let params = args.params();

    let page = match feed.search(&params).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(error = %e, "search failed");
            anyhow::bail!("{}", e.user_message());
        }
    };

    if let Some(page) = &page {
        print_page(page, &args)?;
        if args.show_options {
            print!("{}", render_options(&feed.available_options()));
        }
    }

    if !args.watch {
        return Ok(());
    }

    if !feed.preferences().auto_refresh {
        eprintln!("Auto-refresh is off. Enable it with `newsdesk prefs set --auto-refresh true`.");
        return Ok(());
    }

    eprintln!(
        "Refreshing every {} minutes. Press Ctrl-C to stop.",
        AUTO_REFRESH_INTERVAL.as_secs() / 60
    );

    let refresh = feed.auto_refresh(&params, AUTO_REFRESH_INTERVAL, |result| {
        match result {
            Ok(Some(page)) => {
                if let Err(e) = print_page(&page, &args) {
                    tracing::error!(error = %e, "failed to print refreshed page");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "auto-refresh failed");
                eprintln!("{}", e.user_message());
            }
        }
        ControlFlow::Continue(())
    });

    tokio::select! {
        _ = refresh => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::debug!("interrupted, stopping auto-refresh");
        }
    }

    Ok(())
}

fn print_page(page: &FeedPage, args: &SearchArgs) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(&page.articles).context("Failed to serialize articles")?;
        println!("{}", json);
        return Ok(());
    }

    if let Some(message) = page.empty_message() {
        println!("{}", message);
        return Ok(());
    }

    for article in &page.articles {
        println!("{}", render_article(article, WRAP_WIDTH));
    }
    println!(
        "Showing {} of {} articles{}",
        page.articles.len(),
        page.total_fetched,
        if page.filters_active { " (filtered by preferences)" } else { "" }
    );
    Ok(())
}

fn prefs(config: &Config, command: PrefsCommand) -> Result<()> {
    let mut store = preference_store(config);

    let prefs = match command {
        PrefsCommand::Show => store.preferences(),
        PrefsCommand::Set(args) => store.update(args.update()),
        PrefsCommand::Reset => store.reset(),
    };

    print!("{}", render_preferences(prefs));
    Ok(())
}

/// One article as a wrapped text block
pub fn render_article(article: &Article, width: usize) -> String {
    let mut out = String::new();

    for line in textwrap::wrap(&article.title, width) {
        out.push_str(&line);
        out.push('\n');
    }

    let mut meta = vec![article.source.clone()];
    if let Some(author) = &article.author {
        meta.push(author.clone());
    }
    meta.push(crate::dates::format_date(&article.published_at));
    if let Some(category) = &article.category {
        meta.push(category.clone());
    }
    out.push_str(&format!("  {}\n", meta.join(" | ")));

    if !article.description.trim().is_empty() {
        let options = textwrap::Options::new(width)
            .initial_indent("  ")
            .subsequent_indent("  ");
        for line in textwrap::wrap(article.description.trim(), options) {
            out.push_str(&line);
            out.push('\n');
        }
    }

    if !article.url.is_empty() {
        out.push_str(&format!("  {}\n", article.url));
    }
    out
}

fn join_or_any(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "(any)".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub fn render_preferences(prefs: &UserPreferences) -> String {
    format!(
        "sources:      {}\ncategories:   {}\nauthors:      {}\nauto-refresh: {}\nmax articles: {}\n",
        join_or_any(&prefs.sources),
        join_or_any(&prefs.categories),
        join_or_any(&prefs.authors),
        if prefs.auto_refresh { "on" } else { "off" },
        prefs.max_articles,
    )
}

pub fn render_options(options: &AvailableOptions) -> String {
    format!(
        "\nAvailable sources:    {}\nAvailable categories: {}\nAvailable authors:    {}\n",
        options.sources.join(", "),
        options.categories.join(", "),
        options.authors.join(", "),
    )
}

pub fn render_providers(config: &Config) -> String {
    let mut out = String::new();
    for kind in ProviderKind::ALL {
        let settings = config.providers.get(kind);
        let status = if kind.accepts_key(&settings.api_key) {
            "configured"
        } else {
            "no key"
        };
        out.push_str(&format!(
            "{:<10} {:<16} {:<11} {}\n",
            kind.id(),
            kind.display_name(),
            status,
            settings.api_base().unwrap_or(kind.default_base_url())
        ));
    }
    out
}
