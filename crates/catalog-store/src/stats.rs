use serde::Serialize;

use crate::{AppIndex, EntitlementIndex};

/// Headline counts over the loaded indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Apps with at least one audience definition.
    pub unique_apps: usize,
    /// (app, audience) definitions.
    pub definitions: usize,
    /// Apps with at least one preconfigured entitlement.
    pub apps_with_entitlements: usize,
    /// Stored entitlement records.
    pub entitlements: usize,
}

impl CatalogStats {
    pub fn compute(apps: &AppIndex, entitlements: &EntitlementIndex) -> Self {
        Self {
            unique_apps: apps.iter().filter(|(_, audiences)| !audiences.is_empty()).count(),
            definitions: apps.definition_count(),
            apps_with_entitlements: entitlements
                .iter()
                .filter(|(_, records)| !records.is_empty())
                .count(),
            entitlements: entitlements.entitlement_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{AppDefinition, Entitlement, SourceType};
    use serde_json::json;

    #[test]
    fn counts() {
        let mut apps = AppIndex::new();
        for (id, audience) in [("a", "general"), ("a", "ring0"), ("b", "general")] {
            apps.upsert(AppDefinition::from_record(&json!({"id": id}), audience, SourceType::Store).unwrap());
        }
        let mut entitlements = EntitlementIndex::new();
        let record = json!({"id": "a", "state": "Pinned"});
        entitlements.upsert("ring0", Entitlement::from_record(&record, "tenant", "team").unwrap());
        entitlements.upsert("general", Entitlement::from_record(&record, "tenant", "team").unwrap());

        let stats = CatalogStats::compute(&apps, &entitlements);
        assert_eq!(
            stats,
            CatalogStats {
                unique_apps: 2,
                definitions: 3,
                apps_with_entitlements: 1,
                entitlements: 2,
            }
        );
    }

    #[test]
    fn empty() {
        assert_eq!(
            CatalogStats::compute(&AppIndex::new(), &EntitlementIndex::new()),
            CatalogStats::default()
        );
    }
}
