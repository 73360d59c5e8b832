//! In-memory fetcher and recording sinks shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use catalog_store::CatalogStats;
use catalog_sync::{
    CatalogSettings, CompletionSink, FetchError, JsonFetcher, LoadPhase, ProgressSink, StatusKind,
};
use serde_json::{Value, json};

pub const ENDPOINT: &str = "https://config.test/config/v1?agents=MicrosoftTeamsAppCatalog";

pub fn settings(audience_groups: &[&str]) -> CatalogSettings {
    CatalogSettings {
        config_endpoint: ENDPOINT.to_string(),
        default_audience_group: "general".to_string(),
        audience_groups: audience_groups.iter().map(|g| g.to_string()).collect(),
        timeout_secs: 5,
        user_agent: None,
    }
}

/// Config URL the session will request for `audience_group`.
pub fn config_url(audience_group: &str) -> String {
    settings(&[]).config_url(audience_group)
}

/// Config document listing `(appCatalog key, source url)` pairs; repeated
/// keys accumulate in order.
pub fn config_doc(sources: &[(&str, &str)]) -> Value {
    let mut catalog: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, url) in sources {
        catalog.entry(*key).or_default().push(*url);
    }
    let catalog: serde_json::Map<String, Value> = catalog
        .into_iter()
        .map(|(key, urls)| (key.to_string(), json!({ "sources": urls })))
        .collect();
    json!({ "MicrosoftTeamsAppCatalog": { "appCatalog": catalog } })
}

pub fn definitions_doc(apps: Value) -> Value {
    json!({ "value": { "appDefinitions": apps } })
}

pub fn entitlements_doc(entitlements: Value) -> Value {
    json!({ "value": { "appEntitlements": entitlements } })
}

enum Reply {
    Json(Value),
    Delayed(Duration, Value),
    Status(u16),
}

/// Serves canned documents by URL and counts requests. Unknown URLs get 404.
#[derive(Default)]
pub struct StaticFetcher {
    replies: HashMap<String, Reply>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, url: impl Into<String>, document: Value) -> Self {
        self.replies.insert(url.into(), Reply::Json(document));
        self
    }

    /// Serve `document` only after `delay`, to force a completion order.
    pub fn delayed(mut self, url: impl Into<String>, delay: Duration, document: Value) -> Self {
        self.replies.insert(url.into(), Reply::Delayed(delay, document));
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.replies.insert(url.into(), Reply::Status(status));
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl JsonFetcher for StaticFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        tokio::task::yield_now().await;
        match self.replies.get(url) {
            Some(Reply::Json(document)) => Ok(document.clone()),
            Some(Reply::Delayed(delay, document)) => {
                tokio::time::sleep(*delay).await;
                Ok(document.clone())
            }
            Some(Reply::Status(status)) => Err(FetchError::Server {
                status: *status,
                body: "unavailable".to_string(),
            }),
            None => Err(FetchError::Server {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Records everything both sink traits receive.
#[derive(Default)]
pub struct RecordingSink {
    pub progress: Mutex<Vec<(String, u8)>>,
    pub statuses: Mutex<Vec<(String, StatusKind)>>,
    pub phases: Mutex<Vec<LoadPhase>>,
    pub stats: Mutex<Vec<CatalogStats>>,
    pub finished: Mutex<usize>,
    pub display_ready: Mutex<usize>,
}

impl RecordingSink {
    pub fn percents(&self) -> Vec<u8> {
        self.progress.lock().unwrap().iter().map(|(_, p)| *p).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, message: &str, percent: u8) {
        self.progress
            .lock()
            .unwrap()
            .push((message.to_string(), percent));
    }

    fn on_status(&self, message: &str, kind: StatusKind) {
        self.statuses
            .lock()
            .unwrap()
            .push((message.to_string(), kind));
    }

    fn on_phase(&self, phase: LoadPhase) {
        self.phases.lock().unwrap().push(phase);
    }
}

impl CompletionSink for RecordingSink {
    fn on_stats_changed(&self, stats: &CatalogStats) {
        self.stats.lock().unwrap().push(*stats);
    }

    fn on_load_finished(&self) {
        *self.finished.lock().unwrap() += 1;
    }

    fn on_initial_display_ready(&self) {
        *self.display_ready.lock().unwrap() += 1;
    }
}
