//! App definition aggregation into the [`AppIndex`].

use std::ops::AddAssign;
use std::sync::Mutex;

use catalog_core::{AppDefinition, SourceCategory, SourceType};
use catalog_store::AppIndex;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{CatalogConfig, UrlCache, lock};

/// Counts from merging one or more source documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Sources fetched and merged.
    pub sources_loaded: usize,
    /// Sources whose fetch failed.
    pub sources_failed: usize,
    /// Records stored in the index.
    pub merged: usize,
    /// Records skipped: no id, or (for entitlements) no resolvable app id.
    pub skipped: usize,
    /// Entitlements dropped because their app isn't defined for the audience.
    pub dangling: usize,
}

impl AddAssign for MergeReport {
    fn add_assign(&mut self, other: Self) {
        self.sources_loaded += other.sources_loaded;
        self.sources_failed += other.sources_failed;
        self.merged += other.merged;
        self.skipped += other.skipped;
        self.dangling += other.dangling;
    }
}

/// Merges `value.appDefinitions` documents into a shared [`AppIndex`].
pub struct AppDefinitionAggregator<'a> {
    cache: &'a UrlCache,
    apps: &'a Mutex<AppIndex>,
}

impl<'a> AppDefinitionAggregator<'a> {
    pub fn new(cache: &'a UrlCache, apps: &'a Mutex<AppIndex>) -> Self {
        Self { cache, apps }
    }

    /// Load every definition category of one audience group's config.
    ///
    /// Categories run one after another in [`SourceType::MERGE_ORDER`], so for
    /// the same app and audience an override record always lands last.
    pub async fn load_for_audience(&self, config: &CatalogConfig) -> MergeReport {
        let audience_group = config.audience_group();
        let mut report = MergeReport::default();
        for source_type in SourceType::MERGE_ORDER {
            let sources = config.sources(SourceCategory::Definitions(source_type));
            if sources.is_empty() {
                continue;
            }
            report += self
                .load_definitions(&sources, audience_group, source_type)
                .await;
        }
        info!(
            audience_group = %audience_group,
            merged = report.merged,
            failed_sources = report.sources_failed,
            "app definitions loaded"
        );
        report
    }

    /// Fetch `sources` concurrently and merge each as soon as it arrives.
    ///
    /// A failed source is logged and skipped; it never affects the others.
    pub async fn load_definitions(
        &self,
        sources: &[String],
        audience_group: &str,
        source_type: SourceType,
    ) -> MergeReport {
        let loads = sources.iter().map(|url| async move {
            match self.cache.fetch(url).await {
                Ok(document) => self.merge_document(&document, audience_group, source_type),
                Err(err) => {
                    warn!(
                        url = %url,
                        audience_group = %audience_group,
                        %source_type,
                        error = %err,
                        "error loading app definitions"
                    );
                    MergeReport {
                        sources_failed: 1,
                        ..MergeReport::default()
                    }
                }
            }
        });

        let mut report = MergeReport::default();
        for source_report in join_all(loads).await {
            report += source_report;
        }
        report
    }

    /// Upsert every app of one fetched document. Synchronous: the whole
    /// document is merged under one lock.
    pub fn merge_document(
        &self,
        document: &Value,
        audience_group: &str,
        source_type: SourceType,
    ) -> MergeReport {
        let mut report = MergeReport {
            sources_loaded: 1,
            ..MergeReport::default()
        };
        let Some(records) = document
            .pointer("/value/appDefinitions")
            .and_then(Value::as_array)
        else {
            debug!(audience_group = %audience_group, %source_type, "document has no appDefinitions");
            return report;
        };

        let mut apps = lock(self.apps);
        for record in records {
            match AppDefinition::from_record(record, audience_group, source_type) {
                Some(definition) => {
                    apps.upsert(definition);
                    report.merged += 1;
                }
                None => report.skipped += 1,
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProgressReporter;
    use crate::progress::NoopSink;
    use crate::{FetchError, JsonFetcher};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapFetcher(HashMap<&'static str, Value>);

    #[async_trait]
    impl JsonFetcher for MapFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
            self.0.get(url).cloned().ok_or(FetchError::Server {
                status: 404,
                body: String::new(),
            })
        }
    }

    fn cache(docs: &[(&'static str, Value)]) -> UrlCache {
        let fetcher = MapFetcher(docs.iter().cloned().collect());
        UrlCache::new(
            Arc::new(fetcher),
            Arc::new(ProgressReporter::new(Arc::new(NoopSink))),
        )
    }

    fn definitions(apps: &[Value]) -> Value {
        json!({"value": {"appDefinitions": apps}})
    }

    #[tokio::test]
    async fn merges_and_skips_records_without_id() {
        let cache = cache(&[(
            "https://s/store.json",
            definitions(&[json!({"id": "a", "version": "1.0"}), json!({"name": "no id"}), json!({"id": "b"})]),
        )]);
        let apps = Mutex::new(AppIndex::new());
        let report = AppDefinitionAggregator::new(&cache, &apps)
            .load_definitions(&["https://s/store.json".into()], "general", SourceType::Store)
            .await;

        assert_eq!(report.merged, 2);
        assert_eq!(report.skipped, 1);
        let apps = apps.into_inner().unwrap();
        assert_eq!(apps.len(), 2);
        let a = apps.definition("a", "general").unwrap();
        assert_eq!(a.source_type, SourceType::Store);
        assert_eq!(a.audience_group, "general");
    }

    #[tokio::test]
    async fn failed_source_does_not_block_others() {
        let cache = cache(&[("https://s/ok.json", definitions(&[json!({"id": "a"})]))]);
        let apps = Mutex::new(AppIndex::new());
        let report = AppDefinitionAggregator::new(&cache, &apps)
            .load_definitions(
                &["https://s/missing.json".into(), "https://s/ok.json".into()],
                "ring0",
                SourceType::Core,
            )
            .await;

        assert_eq!(report.sources_failed, 1);
        assert_eq!(report.sources_loaded, 1);
        assert!(apps.lock().unwrap().has("a", "ring0"));
    }

    #[tokio::test]
    async fn document_without_definitions_is_ignored() {
        let cache = cache(&[("https://s/empty.json", json!({"value": {}}))]);
        let apps = Mutex::new(AppIndex::new());
        let report = AppDefinitionAggregator::new(&cache, &apps)
            .load_definitions(&["https://s/empty.json".into()], "general", SourceType::Store)
            .await;
        assert_eq!(report.sources_loaded, 1);
        assert_eq!(report.merged, 0);
        assert!(apps.lock().unwrap().is_empty());
    }
}
