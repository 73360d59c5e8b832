use std::collections::BTreeSet;

use catalog_core::{AppDefinition, AppId, AudienceGroup, OrderedMap, SourceType, compare_versions};
use tracing::trace;

/// Per-audience definitions of one app, in first-insertion order.
pub type AudienceDefinitions = OrderedMap<AudienceGroup, AppDefinition>;

/// App definitions keyed by app id, then audience group.
///
/// Each (app, audience) pair holds at most one definition; a later upsert for
/// the same pair replaces the earlier one. The representative definition of an
/// app is the first audience entry ever inserted for it, which stays stable
/// for the life of the index because entries are never removed.
#[derive(Debug, Default, Clone)]
pub struct AppIndex {
    apps: OrderedMap<AppId, AudienceDefinitions>,
}

/// Audience groups of one app that declare the same version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionGroup<'a> {
    /// `None` when the definitions carry no version.
    pub version: Option<&'a str>,
    /// Sorted audience groups declaring this version.
    pub audiences: Vec<&'a str>,
    /// Source types those definitions were merged from.
    pub source_types: BTreeSet<SourceType>,
    /// First definition seen for this version.
    pub definition: &'a AppDefinition,
}

impl AppIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition at `[definition.id][definition.audience_group]`.
    ///
    /// Returns the definition it replaced, if any.
    pub fn upsert(&mut self, definition: AppDefinition) -> Option<AppDefinition> {
        let audience_group = definition.audience_group.clone();
        let replaced = self
            .apps
            .get_or_insert_with(definition.id.clone(), OrderedMap::new)
            .insert(audience_group, definition);
        if let Some(previous) = &replaced {
            trace!(
                app_id = %previous.id,
                audience_group = %previous.audience_group,
                replaced_source = %previous.source_type,
                "app definition replaced"
            );
        }
        replaced
    }

    pub fn get(&self, app_id: &str) -> Option<&AudienceDefinitions> {
        self.apps.get(app_id)
    }

    pub fn definition(&self, app_id: &str, audience_group: &str) -> Option<&AppDefinition> {
        self.apps.get(app_id)?.get(audience_group)
    }

    /// Whether `app_id` is defined for `audience_group`.
    pub fn has(&self, app_id: &str, audience_group: &str) -> bool {
        self.apps
            .get(app_id)
            .is_some_and(|audiences| audiences.contains_key(audience_group))
    }

    pub fn contains_app(&self, app_id: &str) -> bool {
        self.apps.contains_key(app_id)
    }

    /// First-inserted definition of an app.
    pub fn representative(&self, app_id: &str) -> Option<&AppDefinition> {
        self.apps.get(app_id)?.first().map(|(_, definition)| definition)
    }

    /// Number of distinct app ids.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Number of (app, audience) definitions.
    pub fn definition_count(&self) -> usize {
        self.apps.values().map(OrderedMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AppId, &AudienceDefinitions)> {
        self.apps.iter()
    }

    pub fn clear(&mut self) {
        self.apps.clear();
    }

    /// An app's audience groups grouped by declared version, newest first.
    ///
    /// Versions compare segment-wise numerically; definitions without a
    /// version sort last.
    pub fn version_groups(&self, app_id: &str) -> Vec<VersionGroup<'_>> {
        let Some(audiences) = self.apps.get(app_id) else {
            return Vec::new();
        };

        let mut groups: Vec<VersionGroup<'_>> = Vec::new();
        for (audience_group, definition) in audiences {
            let version = definition.version.as_deref();
            match groups.iter_mut().find(|g| g.version == version) {
                Some(group) => {
                    group.audiences.push(audience_group);
                    group.source_types.insert(definition.source_type);
                }
                None => groups.push(VersionGroup {
                    version,
                    audiences: vec![audience_group.as_str()],
                    source_types: BTreeSet::from([definition.source_type]),
                    definition,
                }),
            }
        }

        for group in &mut groups {
            group.audiences.sort_unstable();
        }
        groups.sort_by(|a, b| match (a.version, b.version) {
            (Some(a), Some(b)) => compare_versions(b, a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        groups
    }
}
