//! Two-phase catalog load: configs, then definitions, then entitlements.

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use catalog_core::{AudienceGroup, OrderedMap};
use catalog_store::{AppIndex, CatalogStats, EntitlementIndex};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::progress::{StatusKind, band};
use crate::{
    AppDefinitionAggregator, CatalogConfig, CatalogConfigLoader, CatalogSettings, CompletionSink,
    EntitlementAggregator, LoadError, MergeReport, ProgressReporter, SourceRegistry, UrlCache,
};

/// Where a load pass currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadPhase {
    #[default]
    Idle,
    LoadingConfigs,
    AnalyzingSources,
    LoadingDefinitions,
    LoadingEntitlements,
    Done,
    /// Every audience group's config failed.
    Failed,
}

/// Everything one load generation produces.
#[derive(Debug, Default)]
pub struct CatalogData {
    /// Successfully loaded configs, in audience request order.
    pub configs: OrderedMap<AudienceGroup, CatalogConfig>,
    pub apps: AppIndex,
    pub entitlements: EntitlementIndex,
    pub sources: SourceRegistry,
}

/// Source fetch counters for a finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    /// Unique source URLs across all configs.
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Requests avoided because several audience groups share a URL.
    pub saved_requests: usize,
}

/// Result of a load pass that produced at least one config.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub loaded_audience_groups: Vec<AudienceGroup>,
    /// `(audience group, error)` for every group whose config failed.
    pub failed_audience_groups: Vec<(AudienceGroup, String)>,
    pub definitions: MergeReport,
    pub entitlements: MergeReport,
    pub stats: CatalogStats,
    pub sources: SourceStats,
    pub finished_at: DateTime<Utc>,
}

/// Drives one load pass over a [`CatalogData`] generation.
pub struct CatalogLoadOrchestrator<'a> {
    settings: &'a CatalogSettings,
    cache: &'a UrlCache,
    progress: &'a ProgressReporter,
    completion: &'a dyn CompletionSink,
}

impl<'a> CatalogLoadOrchestrator<'a> {
    pub fn new(
        settings: &'a CatalogSettings,
        cache: &'a UrlCache,
        progress: &'a ProgressReporter,
        completion: &'a dyn CompletionSink,
    ) -> Self {
        Self {
            settings,
            cache,
            progress,
            completion,
        }
    }

    /// Run a full pass. `data` should be empty and `cache` fresh.
    ///
    /// Only a total config failure is an error; any other failure leaves
    /// partial data and is reported in the summary.
    pub async fn run(
        &self,
        data: &mut CatalogData,
        phase: &mut LoadPhase,
    ) -> Result<LoadSummary, LoadError> {
        self.enter(phase, LoadPhase::LoadingConfigs);
        let failed_audience_groups = self.load_configs(data).await;
        let attempted = self.settings.audience_groups.len();

        if data.configs.is_empty() {
            self.enter(phase, LoadPhase::Failed);
            let message = format!("Failed to load any catalog configurations ({attempted} attempted)");
            self.progress.report(&message, 100);
            self.progress.status(&message, StatusKind::Error);
            return Err(LoadError::TotalConfigFailure { attempted });
        }

        let loaded = data.configs.len();
        let message = if failed_audience_groups.is_empty() {
            format!("Connected to {loaded} audience groups")
        } else {
            format!(
                "Connected to {loaded} audience groups ({} failed)",
                failed_audience_groups.len()
            )
        };
        self.progress.report(&message, 20);
        for (audience_group, err) in &failed_audience_groups {
            self.progress.status(
                &format!("Audience group {audience_group} unavailable: {err}"),
                StatusKind::Warning,
            );
        }

        self.enter(phase, LoadPhase::AnalyzingSources);
        self.progress.report("Analyzing data sources...", 25);
        self.analyze_sources(data);
        self.progress.report(
            &format!("Found {} unique data sources", data.sources.len()),
            30,
        );

        self.enter(phase, LoadPhase::LoadingDefinitions);
        let definitions = self.load_definitions(data).await;
        self.progress.report("App definitions loaded", 65);

        self.enter(phase, LoadPhase::LoadingEntitlements);
        let entitlements = self.load_entitlements(data).await;
        self.progress.report("Finalizing...", 95);

        let stats = CatalogStats::compute(&data.apps, &data.entitlements);
        let sources = SourceStats {
            total: data.sources.len(),
            loaded: self.cache.loaded_sources(),
            failed: self.cache.failed_sources(),
            saved_requests: data.sources.saved_requests(),
        };
        info!(
            unique_apps = stats.unique_apps,
            definitions = stats.definitions,
            entitlements = stats.entitlements,
            sources = sources.total,
            failed_sources = sources.failed,
            saved_requests = sources.saved_requests,
            "catalog load complete"
        );

        self.enter(phase, LoadPhase::Done);
        self.progress.report(
            &format!(
                "All catalog data loaded! Cache saved {} requests.",
                sources.saved_requests
            ),
            100,
        );
        self.progress.status(
            &format!(
                "Loaded {} apps with {} preconfigured entitlements",
                stats.unique_apps, stats.entitlements
            ),
            StatusKind::Success,
        );
        self.completion.on_stats_changed(&stats);
        self.completion.on_initial_display_ready();
        self.completion.on_load_finished();

        Ok(LoadSummary {
            loaded_audience_groups: data.configs.keys().cloned().collect(),
            failed_audience_groups,
            definitions,
            entitlements,
            stats,
            sources,
            finished_at: Utc::now(),
        })
    }

    fn enter(&self, phase: &mut LoadPhase, next: LoadPhase) {
        debug!(from = ?*phase, to = ?next, "load phase");
        *phase = next;
        self.progress.phase(next);
    }

    /// Fetch every audience group's config concurrently; returns the failures.
    async fn load_configs(&self, data: &mut CatalogData) -> Vec<(AudienceGroup, String)> {
        let audience_groups = &self.settings.audience_groups;
        let total = audience_groups.len();
        self.progress
            .report("Connecting to catalog configuration service...", 5);

        let loader = CatalogConfigLoader::new(self.settings, self.cache);
        let settled = AtomicUsize::new(0);
        let loads = audience_groups.iter().map(|audience_group| {
            let loader = &loader;
            let settled = &settled;
            async move {
                let result = loader.load_config(audience_group).await;
                let done = settled.fetch_add(1, Ordering::SeqCst) + 1;
                self.progress.report(
                    &format!("Loaded configuration {done}/{total} ({audience_group})"),
                    band(5, 15, done, total),
                );
                (audience_group, result)
            }
        });

        let mut failed = Vec::new();
        for (audience_group, result) in join_all(loads).await {
            match result {
                Ok(config) => {
                    data.configs.insert(audience_group.clone(), config);
                }
                Err(err) => failed.push((audience_group.clone(), err.to_string())),
            }
        }
        if !failed.is_empty() {
            warn!(
                failed = failed.len(),
                loaded = data.configs.len(),
                "some audience group configurations failed"
            );
        }
        failed
    }

    fn analyze_sources(&self, data: &mut CatalogData) {
        let mut referenced = 0;
        for config in data.configs.values() {
            referenced += config.register_sources(&mut data.sources);
        }
        info!(
            referenced,
            unique = data.sources.len(),
            saved_requests = data.sources.saved_requests(),
            "analyzed data sources"
        );
        self.cache.begin_sources(data.sources.len());
    }

    /// Every group's definitions load concurrently; within a group the
    /// categories stay sequential. Returns once all groups have settled.
    async fn load_definitions(&self, data: &mut CatalogData) -> MergeReport {
        let apps = Mutex::new(mem::take(&mut data.apps));
        let aggregator = AppDefinitionAggregator::new(self.cache, &apps);
        let total = data.configs.len();
        let settled = AtomicUsize::new(0);

        let loads = data.configs.values().map(|config| {
            let aggregator = &aggregator;
            let settled = &settled;
            async move {
                let report = aggregator.load_for_audience(config).await;
                let done = settled.fetch_add(1, Ordering::SeqCst) + 1;
                self.progress.report(
                    &format!("Loaded app definitions for {}", config.audience_group()),
                    band(30, 35, done, total),
                );
                report
            }
        });
        let mut report = MergeReport::default();
        for audience_report in join_all(loads).await {
            report += audience_report;
        }

        data.apps = apps.into_inner().unwrap_or_else(PoisonError::into_inner);
        report
    }

    /// Runs only after every definition has settled; the app index is
    /// borrowed read-only for the referential check.
    async fn load_entitlements(&self, data: &mut CatalogData) -> MergeReport {
        let entitlements = Mutex::new(mem::take(&mut data.entitlements));
        let report = {
            let aggregator = EntitlementAggregator::new(self.cache, &data.apps, &entitlements);
            let total = data.configs.len();
            let settled = AtomicUsize::new(0);

            let loads = data.configs.values().map(|config| {
                let aggregator = &aggregator;
                let settled = &settled;
                async move {
                    let report = aggregator.load_for_audience(config).await;
                    let done = settled.fetch_add(1, Ordering::SeqCst) + 1;
                    self.progress.report(
                        &format!(
                            "Loaded preconfigured entitlements for {}",
                            config.audience_group()
                        ),
                        band(65, 30, done, total),
                    );
                    report
                }
            });
            let mut report = MergeReport::default();
            for audience_report in join_all(loads).await {
                report += audience_report;
            }
            report
        };

        data.entitlements = entitlements
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        report
    }
}
