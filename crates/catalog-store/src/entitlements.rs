use catalog_core::{AppId, Entitlement, EntitlementKey, OrderedMap};

/// Per-app entitlements keyed by `audienceGroup.scope.context`.
pub type AppEntitlements = OrderedMap<EntitlementKey, Entitlement>;

/// Preconfigured entitlements keyed by app id, then [`EntitlementKey`].
///
/// A later upsert for the same key replaces the earlier record.
#[derive(Debug, Default, Clone)]
pub struct EntitlementIndex {
    apps: OrderedMap<AppId, AppEntitlements>,
}

impl EntitlementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entitlement declared for `audience_group`, keyed by its own
    /// scope and context. Returns the record it replaced, if any.
    pub fn upsert(&mut self, audience_group: &str, entitlement: Entitlement) -> Option<Entitlement> {
        let key = EntitlementKey::new(audience_group, &entitlement.scope, &entitlement.context);
        self.apps
            .get_or_insert_with(entitlement.app_id.clone(), OrderedMap::new)
            .insert(key, entitlement)
    }

    pub fn get(&self, app_id: &str) -> Option<&AppEntitlements> {
        self.apps.get(app_id)
    }

    pub fn contains_app(&self, app_id: &str) -> bool {
        self.apps.contains_key(app_id)
    }

    /// Number of apps with at least one entitlement.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Total number of stored entitlement records.
    pub fn entitlement_count(&self) -> usize {
        self.apps.values().map(OrderedMap::len).sum()
    }

    /// Number of stored records declared for one audience group.
    pub fn count_for_audience(&self, audience_group: &str) -> usize {
        self.entries()
            .filter(|(_, key, _)| key.audience_group() == audience_group)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AppId, &AppEntitlements)> {
        self.apps.iter()
    }

    /// Every record as `(app id, key, entitlement)`.
    pub fn entries(&self) -> impl Iterator<Item = (&AppId, &EntitlementKey, &Entitlement)> {
        self.apps.iter().flat_map(|(app_id, entitlements)| {
            entitlements
                .iter()
                .map(move |(key, entitlement)| (app_id, key, entitlement))
        })
    }

    pub fn clear(&mut self) {
        self.apps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ent(app_id: &str, state: &str, scope: &str, context: &str) -> Entitlement {
        Entitlement::from_record(&json!({"id": app_id, "state": state}), scope, context).unwrap()
    }

    #[test]
    fn upsert_builds_composite_key() {
        let mut index = EntitlementIndex::new();
        index.upsert("ring0", ent("appA", "Pinned", "tenant", "team"));
        let stored = index.get("appA").unwrap().get("ring0.tenant.team").unwrap();
        assert_eq!(stored.state.as_deref(), Some("Pinned"));
        assert_eq!(stored.app_id, "appA");
    }

    #[test]
    fn same_key_last_write_wins() {
        let mut index = EntitlementIndex::new();
        index.upsert("general", ent("a", "Installed", "user", "default"));
        let replaced = index.upsert("general", ent("a", "Blocked", "user", "default"));
        assert_eq!(replaced.and_then(|e| e.state), Some("Installed".to_string()));
        assert_eq!(index.entitlement_count(), 1);
        let stored = index.get("a").unwrap().get("general.user.default").unwrap();
        assert_eq!(stored.state.as_deref(), Some("Blocked"));
    }

    #[test]
    fn counts_per_audience() {
        let mut index = EntitlementIndex::new();
        index.upsert("general", ent("a", "Installed", "user", "default"));
        index.upsert("ring0", ent("a", "Installed", "user", "default"));
        index.upsert("ring0", ent("b", "Pinned", "tenant", "team"));
        assert_eq!(index.len(), 2);
        assert_eq!(index.entitlement_count(), 3);
        assert_eq!(index.count_for_audience("ring0"), 2);
        assert_eq!(index.count_for_audience("staff"), 0);
        assert_eq!(index.entries().count(), 3);
    }
}
