//! Common test utilities and fixtures for feed and provider testing

#![allow(dead_code)]

use newsdesk::prefs::{JsonFileStore, PreferenceStore, Storage};
use newsdesk::search::{Article, NewsProvider, ProviderError, SearchParams};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Test fixture for on-disk preference storage
pub struct TestFixture {
    /// Temporary directory that gets cleaned up automatically
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub fn store_dir(&self) -> PathBuf {
        self.path().join("store")
    }

    pub fn storage(&self) -> Storage {
        Storage::new(Arc::new(JsonFileStore::with_dir(self.store_dir())))
    }

    pub fn preference_store(&self) -> PreferenceStore {
        PreferenceStore::load(self.storage())
    }

    /// Write a raw file into the store directory
    pub fn write_store_file(&self, name: &str, content: &str) -> PathBuf {
        let dir = self.store_dir();
        std::fs::create_dir_all(&dir).expect("Failed to create store dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("Failed to write store file");
        path
    }

    pub fn read_store_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.store_dir().join(name)).expect("Failed to read store file")
    }
}

/// Article with the fields the engine looks at
pub fn article(id: &str, source: &str, published_at: &str) -> Article {
    Article {
        id: id.to_string(),
        title: format!("Story {}", id),
        description: String::new(),
        url: format!("https://news.test/{}", id),
        image_url: None,
        source: source.to_string(),
        author: None,
        published_at: published_at.to_string(),
        category: None,
    }
}

pub fn ids(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id.as_str()).collect()
}

/// Scripted reply of a [`FakeProvider`]
#[derive(Clone)]
pub enum Reply {
    Articles(Vec<Article>),
    Status(u16),
}

/// In-process provider that replays scripted replies. The n-th call uses the
/// n-th reply; once the script runs out the last reply repeats.
pub struct FakeProvider {
    name: String,
    native: bool,
    script: Vec<(Duration, Reply)>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SearchParams>>,
}

impl FakeProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            native: false,
            script: Vec::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn native(mut self) -> Self {
        self.native = true;
        self
    }

    pub fn reply(self, articles: Vec<Article>) -> Self {
        self.reply_after(Duration::ZERO, Reply::Articles(articles))
    }

    pub fn fail(self, status: u16) -> Self {
        self.reply_after(Duration::ZERO, Reply::Status(status))
    }

    pub fn reply_after(mut self, delay: Duration, reply: Reply) -> Self {
        self.script.push((delay, reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SearchParams> {
        self.seen.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl NewsProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn filters_category_natively(&self) -> bool {
        self.native
    }

    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Article>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(params.clone());

        let Some((delay, reply)) = self.script.get(call).or_else(|| self.script.last()).cloned() else {
            return Ok(Vec::new());
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Articles(articles) => Ok(articles),
            Reply::Status(status) => Err(ProviderError::Http {
                status,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

/// Coerce concrete fakes into the trait objects the aggregator takes
pub fn providers(fakes: &[Arc<FakeProvider>]) -> Vec<Arc<dyn NewsProvider>> {
    fakes
        .iter()
        .map(|fake| fake.clone() as Arc<dyn NewsProvider>)
        .collect()
}
