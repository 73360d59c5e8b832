//! URL-keyed fetch deduplication.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tracing::debug;

use crate::progress::{ProgressReporter, band};
use crate::{FetchError, JsonFetcher, lock};

/// Outcome of one fetch, shared by every caller of the same URL.
pub type FetchResult = Result<Arc<Value>, Arc<FetchError>>;

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Progress band covered by source fetches (definitions and entitlements).
const SOURCES_FROM: u8 = 30;
const SOURCES_SPAN: u8 = 65;

/// Memoizes fetches by URL for one load generation.
///
/// The first caller for a URL stores the *pending* shared future before
/// awaiting it, so near-simultaneous callers join the same request instead of
/// starting their own. Settled results, failures included, are handed to
/// every later caller.
pub struct UrlCache {
    fetcher: Arc<dyn JsonFetcher>,
    entries: Mutex<HashMap<String, SharedFetch>>,
    counter: Arc<SourceCounter>,
}

/// Settlement counters, updated once per unique URL.
struct SourceCounter {
    loaded: AtomicUsize,
    failed: AtomicUsize,
    total: AtomicUsize,
    progress: Arc<ProgressReporter>,
}

impl SourceCounter {
    fn settled(&self, ok: bool) {
        let loaded = self.loaded.fetch_add(1, Ordering::SeqCst) + 1;
        if !ok {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            // Config fetches settle before sources are counted.
            return;
        }
        let percent = band(SOURCES_FROM, SOURCES_SPAN, loaded, total);
        if ok {
            self.progress
                .report(&format!("Loaded {loaded}/{total} data sources..."), percent);
        } else {
            self.progress
                .report(&format!("Error loading source {loaded}/{total}"), percent);
        }
    }
}

impl UrlCache {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, progress: Arc<ProgressReporter>) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
            counter: Arc::new(SourceCounter {
                loaded: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                total: AtomicUsize::new(0),
                progress,
            }),
        }
    }

    /// Fetch `url`, joining any earlier request for the same URL.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let shared = {
            let mut entries = lock(&self.entries);
            match entries.get(url) {
                Some(existing) => {
                    debug!(url = %url, "cache hit");
                    existing.clone()
                }
                None => {
                    let request = self.request(url);
                    entries.insert(url.to_string(), request.clone());
                    request
                }
            }
        };
        shared.await
    }

    fn request(&self, url: &str) -> SharedFetch {
        let fetcher = Arc::clone(&self.fetcher);
        let counter = Arc::clone(&self.counter);
        let url = url.to_string();
        async move {
            debug!(url = %url, "fetching source");
            let result = fetcher
                .fetch_json(&url)
                .await
                .map(Arc::new)
                .map_err(Arc::new);
            counter.settled(result.is_ok());
            result
        }
        .boxed()
        .shared()
    }

    /// Start counting source settlements against `total` unique sources.
    ///
    /// Resets the loaded/failed counters; anything settled before this call
    /// (the config documents) no longer counts.
    pub fn begin_sources(&self, total: usize) {
        self.counter.loaded.store(0, Ordering::SeqCst);
        self.counter.failed.store(0, Ordering::SeqCst);
        self.counter.total.store(total, Ordering::SeqCst);
    }

    /// Sources settled since [`begin_sources`](Self::begin_sources).
    pub fn loaded_sources(&self) -> usize {
        self.counter.loaded.load(Ordering::SeqCst)
    }

    /// Sources that settled with an error.
    pub fn failed_sources(&self) -> usize {
        self.counter.failed.load(Ordering::SeqCst)
    }

    /// Number of distinct URLs requested.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Drop every entry. Requests already in flight finish for whoever is
    /// still awaiting them; their results are not stored.
    pub fn clear(&self) {
        lock(&self.entries).clear();
        self.begin_sources(0);
    }
}
