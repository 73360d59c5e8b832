//! Preconfigured entitlement aggregation into the [`EntitlementIndex`].

use std::sync::Mutex;

use catalog_core::{Entitlement, SourceCategory};
use catalog_store::{AppIndex, EntitlementIndex};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::{CatalogConfig, MergeReport, UrlCache, lock};

/// Merges `value.appEntitlements` documents into a shared [`EntitlementIndex`].
///
/// Holds the [`AppIndex`] by shared reference: definitions must be complete
/// for every audience group before entitlements are merged, and nothing can
/// change them while an aggregator exists.
pub struct EntitlementAggregator<'a> {
    cache: &'a UrlCache,
    apps: &'a AppIndex,
    entitlements: &'a Mutex<EntitlementIndex>,
}

impl<'a> EntitlementAggregator<'a> {
    pub fn new(
        cache: &'a UrlCache,
        apps: &'a AppIndex,
        entitlements: &'a Mutex<EntitlementIndex>,
    ) -> Self {
        Self {
            cache,
            apps,
            entitlements,
        }
    }

    /// Load the entitlement sources of one audience group's config.
    pub async fn load_for_audience(&self, config: &CatalogConfig) -> MergeReport {
        let audience_group = config.audience_group();
        let sources = config.sources(SourceCategory::Entitlements);
        if sources.is_empty() {
            return MergeReport::default();
        }
        let report = self.load_entitlements(&sources, audience_group).await;
        info!(
            audience_group = %audience_group,
            merged = report.merged,
            dangling = report.dangling,
            total_for_audience = lock(self.entitlements).count_for_audience(audience_group),
            "preconfigured entitlements loaded"
        );
        report
    }

    /// Fetch `sources` concurrently and merge each as soon as it arrives.
    pub async fn load_entitlements(&self, sources: &[String], audience_group: &str) -> MergeReport {
        let loads = sources.iter().map(|url| async move {
            match self.cache.fetch(url).await {
                Ok(document) => self.merge_document(&document, audience_group),
                Err(err) => {
                    warn!(
                        url = %url,
                        audience_group = %audience_group,
                        error = %err,
                        "error loading app entitlements"
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

    /// Merge one document's `appEntitlements[scope][context][]` records.
    ///
    /// Null elements and records without `id`/`appId` are skipped. Records
    /// whose app has no definition for `audience_group` are dropped.
    pub fn merge_document(&self, document: &Value, audience_group: &str) -> MergeReport {
        let mut report = MergeReport {
            sources_loaded: 1,
            ..MergeReport::default()
        };
        let Some(scopes) = document
            .pointer("/value/appEntitlements")
            .and_then(Value::as_object)
        else {
            debug!(audience_group = %audience_group, "document has no appEntitlements");
            return report;
        };

        let mut entitlements = lock(self.entitlements);
        for (scope, contexts) in scopes {
            let Some(contexts) = contexts.as_object() else {
                continue;
            };
            for (context, records) in contexts {
                let Some(records) = records.as_array() else {
                    continue;
                };
                for record in records {
                    let Some(entitlement) = Entitlement::from_record(record, scope, context) else {
                        report.skipped += 1;
                        continue;
                    };
                    if !self.apps.has(&entitlement.app_id, audience_group) {
                        trace!(
                            app_id = %entitlement.app_id,
                            audience_group = %audience_group,
                            "dropping entitlement for undefined app"
                        );
                        report.dangling += 1;
                        continue;
                    }
                    entitlements.upsert(audience_group, entitlement);
                    report.merged += 1;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopSink;
    use crate::{FetchError, JsonFetcher, ProgressReporter};
    use async_trait::async_trait;
    use catalog_core::{AppDefinition, SourceType};
    use serde_json::json;
    use std::sync::Arc;

    struct OneDoc(Value);

    #[async_trait]
    impl JsonFetcher for OneDoc {
        async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
            if url == "https://s/ent.json" {
                Ok(self.0.clone())
            } else {
                Err(FetchError::Server {
                    status: 503,
                    body: String::new(),
                })
            }
        }
    }

    fn apps() -> AppIndex {
        let mut apps = AppIndex::new();
        for (id, audience) in [("appA", "ring0"), ("appA", "general"), ("appB", "general")] {
            apps.upsert(AppDefinition::from_record(&json!({"id": id}), audience, SourceType::Store).unwrap());
        }
        apps
    }

    fn cache(document: Value) -> UrlCache {
        UrlCache::new(
            Arc::new(OneDoc(document)),
            Arc::new(ProgressReporter::new(Arc::new(NoopSink))),
        )
    }

    #[tokio::test]
    async fn merges_by_scope_and_context() {
        let cache = cache(json!({"value": {"appEntitlements": {
            "tenant": {
                "team": [{"id": "appA", "state": "Pinned"}, null, {}],
                "meeting": [{"appId": "appA", "state": "Installed"}]
            },
            "user": {"default": [{"id": "appB", "state": "Blocked"}]}
        }}}));
        let apps = apps();
        let entitlements = Mutex::new(EntitlementIndex::new());
        let report = EntitlementAggregator::new(&cache, &apps, &entitlements)
            .load_entitlements(&["https://s/ent.json".into()], "ring0")
            .await;

        // appB is only defined for general.
        assert_eq!(report.merged, 2);
        assert_eq!(report.dangling, 1);
        assert_eq!(report.skipped, 2);

        let entitlements = entitlements.into_inner().unwrap();
        let a = entitlements.get("appA").unwrap();
        let pinned = a.get("ring0.tenant.team").unwrap();
        assert_eq!(pinned.state.as_deref(), Some("Pinned"));
        assert_eq!(pinned.app_id, "appA");
        assert_eq!(pinned.scope, "tenant");
        assert_eq!(pinned.context, "team");
        assert!(a.contains_key("ring0.tenant.meeting"));
        assert!(entitlements.get("appB").is_none());
    }

    #[tokio::test]
    async fn scopes_and_contexts_keep_document_order() {
        let cache = cache(json!({"value": {"appEntitlements": {
            "user": {"default": [{"id": "appA", "state": "Pinned"}]},
            "tenant": {
                "team": [{"id": "appA", "state": "Installed"}],
                "meeting": [{"id": "appA", "state": "Blocked"}]
            }
        }}}));
        let apps = apps();
        let entitlements = Mutex::new(EntitlementIndex::new());
        EntitlementAggregator::new(&cache, &apps, &entitlements)
            .load_entitlements(&["https://s/ent.json".into()], "ring0")
            .await;

        let entitlements = entitlements.into_inner().unwrap();
        let keys: Vec<&str> = entitlements
            .get("appA")
            .unwrap()
            .keys()
            .map(|key| key.as_str())
            .collect();
        assert_eq!(
            keys,
            ["ring0.user.default", "ring0.tenant.team", "ring0.tenant.meeting"]
        );
    }

    #[tokio::test]
    async fn non_array_contexts_are_ignored() {
        let cache = cache(json!({"value": {"appEntitlements": {
            "tenant": {"team": {"id": "appA"}},
            "broken": "nope"
        }}}));
        let apps = apps();
        let entitlements = Mutex::new(EntitlementIndex::new());
        let report = EntitlementAggregator::new(&cache, &apps, &entitlements)
            .load_entitlements(&["https://s/ent.json".into()], "general")
            .await;
        assert_eq!(report.merged, 0);
        assert!(entitlements.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_not_raised() {
        let cache = cache(json!({}));
        let apps = apps();
        let entitlements = Mutex::new(EntitlementIndex::new());
        let report = EntitlementAggregator::new(&cache, &apps, &entitlements)
            .load_entitlements(&["https://s/other.json".into()], "general")
            .await;
        assert_eq!(report.sources_failed, 1);
        assert_eq!(report.merged, 0);
    }
}
