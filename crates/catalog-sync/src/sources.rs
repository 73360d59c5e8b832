use std::collections::{BTreeMap, BTreeSet};

use catalog_core::AudienceGroup;

/// Which audience groups reference each source URL.
///
/// Provenance only: nothing in the merge depends on it.
#[derive(Debug, Default, Clone)]
pub struct SourceRegistry {
    urls: BTreeMap<String, BTreeSet<AudienceGroup>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `audience_group` references `url`.
    pub fn track(&mut self, url: &str, audience_group: &str) {
        self.urls
            .entry(url.to_string())
            .or_default()
            .insert(audience_group.to_string());
    }

    pub fn audiences(&self, url: &str) -> Option<&BTreeSet<AudienceGroup>> {
        self.urls.get(url)
    }

    /// Number of unique source URLs.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Requests that would have been made without deduplication.
    pub fn referenced_requests(&self) -> usize {
        self.urls.values().map(BTreeSet::len).sum()
    }

    /// Requests avoided by fetching each URL once.
    pub fn saved_requests(&self) -> usize {
        self.referenced_requests() - self.len()
    }

    /// URLs in sorted order with their audience groups.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<AudienceGroup>)> {
        self.urls.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_audiences_per_url() {
        let mut registry = SourceRegistry::new();
        registry.track("https://s/general.json", "general");
        registry.track("https://s/general.json", "ring1");
        registry.track("https://s/general.json", "ring1");
        registry.track("https://s/ring0.json", "ring0");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.audiences("https://s/general.json").map(BTreeSet::len), Some(2));
        assert_eq!(registry.referenced_requests(), 3);
        assert_eq!(registry.saved_requests(), 1);
    }

    #[test]
    fn empty_registry_saves_nothing() {
        assert_eq!(SourceRegistry::new().saved_requests(), 0);
    }
}
