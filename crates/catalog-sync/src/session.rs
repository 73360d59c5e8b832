//! The catalog session: owns one load generation and answers queries on it.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use catalog_core::{AppDefinition, AudienceGroup, OrderedMap};
use catalog_store::{
    AppEntitlements, AppIndex, AppListing, CatalogStats, EntitlementIndex, StateApp, StateSummary,
    views,
};
use tracing::info;

use crate::{
    CatalogConfig, CatalogData, CatalogLoadOrchestrator, CatalogSettings, CompletionSink,
    JsonFetcher, LoadError, LoadPhase, LoadSummary, ProgressReporter, ProgressSink,
    SourceRegistry, UrlCache,
};

/// Loads the catalog for every configured audience group and serves the
/// aggregated indices.
///
/// The indices are only mutated by a load pass; [`reset`](Self::reset)
/// discards the whole generation, cache included.
pub struct CatalogSession {
    settings: CatalogSettings,
    fetcher: Arc<dyn JsonFetcher>,
    progress: Arc<ProgressReporter>,
    completion: Arc<dyn CompletionSink>,
    cache: UrlCache,
    data: CatalogData,
    phase: LoadPhase,
}

impl CatalogSession {
    pub fn new(
        settings: CatalogSettings,
        fetcher: Arc<dyn JsonFetcher>,
        progress: Arc<dyn ProgressSink>,
        completion: Arc<dyn CompletionSink>,
    ) -> Self {
        let progress = Arc::new(ProgressReporter::new(progress));
        let cache = UrlCache::new(Arc::clone(&fetcher), Arc::clone(&progress));
        Self {
            settings,
            fetcher,
            progress,
            completion,
            cache,
            data: CatalogData::default(),
            phase: LoadPhase::Idle,
        }
    }

    /// Session over the public config service, reporting through `tracing`.
    #[cfg(feature = "http")]
    pub fn with_http(settings: CatalogSettings) -> Result<Self, crate::FetchError> {
        let fetcher = crate::HttpFetcher::new(settings.timeout(), settings.user_agent.as_deref())?;
        let sink = Arc::new(crate::progress::TracingSink);
        Ok(Self::new(settings, Arc::new(fetcher), sink.clone(), sink))
    }

    /// Load configs, definitions and entitlements for every audience group.
    ///
    /// A session that has already loaded starts a fresh generation first.
    pub async fn load_all_catalog_configurations(&mut self) -> Result<LoadSummary, LoadError> {
        if self.phase != LoadPhase::Idle {
            self.reset();
        }
        info!(
            audience_groups = self.settings.audience_groups.len(),
            endpoint = %self.settings.config_endpoint,
            "loading catalog"
        );
        let orchestrator = CatalogLoadOrchestrator::new(
            &self.settings,
            &self.cache,
            &self.progress,
            self.completion.as_ref(),
        );
        orchestrator.run(&mut self.data, &mut self.phase).await
    }

    /// Drop every config, definition, entitlement and cached response.
    pub fn reset(&mut self) {
        self.cache = UrlCache::new(Arc::clone(&self.fetcher), Arc::clone(&self.progress));
        self.data = CatalogData::default();
        self.phase = LoadPhase::Idle;
        self.progress.reset();
        self.progress.phase(LoadPhase::Idle);
    }

    pub async fn retry(&mut self) -> Result<LoadSummary, LoadError> {
        self.reset();
        self.load_all_catalog_configurations().await
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Representative definition, or the "Unknown App" placeholder.
    pub fn app_info(&self, app_id: &str) -> Cow<'_, AppDefinition> {
        match self.data.apps.representative(app_id) {
            Some(definition) => Cow::Borrowed(definition),
            None => Cow::Owned(AppDefinition::unknown(app_id)),
        }
    }

    pub fn app_preconfigured_entitlements(&self, app_id: &str) -> Option<&AppEntitlements> {
        self.data.entitlements.get(app_id)
    }

    pub fn apps(&self) -> &AppIndex {
        &self.data.apps
    }

    pub fn entitlements(&self) -> &EntitlementIndex {
        &self.data.entitlements
    }

    pub fn configs(&self) -> &OrderedMap<AudienceGroup, CatalogConfig> {
        &self.data.configs
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.data.sources
    }

    pub fn cache(&self) -> &UrlCache {
        &self.cache
    }

    pub fn compute_audience_groups(&self) -> BTreeSet<AudienceGroup> {
        views::compute_audience_groups(&self.data.apps, &self.data.entitlements)
    }

    pub fn analyze_entitlement_states(
        &self,
        audience_filter: &BTreeSet<AudienceGroup>,
    ) -> BTreeMap<String, StateSummary> {
        views::analyze_entitlement_states(&self.data.entitlements, audience_filter)
    }

    pub fn analyze_entitlement_states_unfiltered(&self) -> BTreeMap<String, StateSummary> {
        views::analyze_entitlement_states_unfiltered(&self.data.entitlements)
    }

    pub fn state_apps(&self, state: &str) -> Vec<StateApp<'_>> {
        views::state_apps(&self.data.apps, &self.data.entitlements, state)
    }

    pub fn list_apps(&self) -> Vec<AppListing<'_>> {
        views::list_apps(&self.data.apps, &self.data.entitlements)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats::compute(&self.data.apps, &self.data.entitlements)
    }
}
