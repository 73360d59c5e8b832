//! Per-audience catalog configuration documents.

use std::sync::Arc;

use catalog_core::SourceCategory;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{CatalogError, CatalogSettings, SourceRegistry, UrlCache};

/// Top-level object every valid config document carries.
pub const CATALOG_WRAPPER: &str = "MicrosoftTeamsAppCatalog";
/// Object under the wrapper holding the source lists.
pub const APP_CATALOG: &str = "appCatalog";

/// One audience group's parsed config document, kept for provenance.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    audience_group: String,
    url: String,
    document: Arc<Value>,
}

impl CatalogConfig {
    /// Validate a fetched document: it must carry the catalog wrapper object.
    pub fn from_document(
        audience_group: &str,
        url: &str,
        document: Arc<Value>,
    ) -> Result<Self, CatalogError> {
        if !document.get(CATALOG_WRAPPER).is_some_and(Value::is_object) {
            return Err(CatalogError::ConfigStructure {
                audience_group: audience_group.to_string(),
            });
        }
        Ok(Self {
            audience_group: audience_group.to_string(),
            url: url.to_string(),
            document,
        })
    }

    pub fn audience_group(&self) -> &str {
        &self.audience_group
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Source URLs listed for one category, in declaration order.
    ///
    /// A missing `appCatalog`, category or `sources` array yields nothing;
    /// non-string entries are ignored.
    pub fn sources(&self, category: SourceCategory) -> Vec<String> {
        self.document
            .get(CATALOG_WRAPPER)
            .and_then(|wrapper| wrapper.get(APP_CATALOG))
            .and_then(|catalog| catalog.get(category.config_key()))
            .and_then(|list| list.get("sources"))
            .and_then(Value::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every referenced URL tagged with its category.
    pub fn source_urls(&self) -> Vec<(SourceCategory, String)> {
        SourceCategory::ALL
            .into_iter()
            .flat_map(|category| {
                self.sources(category)
                    .into_iter()
                    .map(move |url| (category, url))
            })
            .collect()
    }

    /// Register every URL this config references against its audience group.
    /// Returns how many URLs were registered.
    pub fn register_sources(&self, registry: &mut SourceRegistry) -> usize {
        let urls = self.source_urls();
        for (category, url) in &urls {
            debug!(audience_group = %self.audience_group, %category, url = %url, "source");
            registry.track(url, &self.audience_group);
        }
        urls.len()
    }
}

/// Fetches config documents through the shared [`UrlCache`].
pub struct CatalogConfigLoader<'a> {
    settings: &'a CatalogSettings,
    cache: &'a UrlCache,
}

impl<'a> CatalogConfigLoader<'a> {
    pub fn new(settings: &'a CatalogSettings, cache: &'a UrlCache) -> Self {
        Self { settings, cache }
    }

    /// Load and validate one audience group's config.
    pub async fn load_config(&self, audience_group: &str) -> Result<CatalogConfig, CatalogError> {
        let url = self.settings.config_url(audience_group);
        let result = match self.cache.fetch(&url).await {
            Ok(document) => CatalogConfig::from_document(audience_group, &url, document),
            Err(source) => Err(CatalogError::Fetch {
                url: url.clone(),
                source,
            }),
        };
        if let Err(err) = &result {
            warn!(audience_group = %audience_group, error = %err, "failed to load catalog configuration");
        }
        result
    }
}
