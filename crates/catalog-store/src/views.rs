//! Views computed on demand from the two indices.
//!
//! Nothing here is cached: the indices are small and every call reflects the
//! index state at the moment it runs.

use std::collections::{BTreeMap, BTreeSet};

use catalog_core::{AppDefinition, AppId, AudienceGroup};
use serde::Serialize;

use crate::{AppIndex, EntitlementIndex};

/// Apps and audience groups that declare one entitlement state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub apps: BTreeSet<AppId>,
    pub audiences: BTreeSet<AudienceGroup>,
}

/// One app carrying a given state, with the audiences that declare it.
#[derive(Debug, Clone, PartialEq)]
pub struct StateApp<'a> {
    pub app_id: &'a str,
    /// Representative definition, or `None` if the app has no definition.
    pub definition: Option<&'a AppDefinition>,
    /// Sorted audience groups in which this app has the state.
    pub audiences: Vec<&'a str>,
}

/// One row of the full app listing.
#[derive(Debug, Clone, PartialEq)]
pub struct AppListing<'a> {
    pub app_id: &'a str,
    pub definition: &'a AppDefinition,
    pub audience_count: usize,
    pub has_entitlements: bool,
}

/// Every audience group present in the loaded data.
///
/// Union of the audience keys of every app definition and the audience prefix
/// of every entitlement key.
pub fn compute_audience_groups(
    apps: &AppIndex,
    entitlements: &EntitlementIndex,
) -> BTreeSet<AudienceGroup> {
    let mut groups: BTreeSet<AudienceGroup> = apps
        .iter()
        .flat_map(|(_, audiences)| audiences.keys().cloned())
        .collect();
    groups.extend(
        entitlements
            .entries()
            .map(|(_, key, _)| key.audience_group())
            .filter(|group| !group.is_empty())
            .map(str::to_string),
    );
    groups
}

/// State histogram restricted to the audience groups in `selected`.
///
/// Summary views use this one; detail views use
/// [`analyze_entitlement_states_unfiltered`] so they always show totals.
pub fn analyze_entitlement_states(
    entitlements: &EntitlementIndex,
    selected: &BTreeSet<AudienceGroup>,
) -> BTreeMap<String, StateSummary> {
    bucket_states(entitlements, |audience_group| selected.contains(audience_group))
}

/// State histogram over every audience group.
pub fn analyze_entitlement_states_unfiltered(
    entitlements: &EntitlementIndex,
) -> BTreeMap<String, StateSummary> {
    bucket_states(entitlements, |_| true)
}

fn bucket_states(
    entitlements: &EntitlementIndex,
    include: impl Fn(&str) -> bool,
) -> BTreeMap<String, StateSummary> {
    let mut states: BTreeMap<String, StateSummary> = BTreeMap::new();
    for (app_id, key, entitlement) in entitlements.entries() {
        let audience_group = key.audience_group();
        if !include(audience_group) {
            continue;
        }
        let summary = states
            .entry(entitlement.state_or_unspecified().to_string())
            .or_default();
        summary.apps.insert(app_id.clone());
        summary.audiences.insert(audience_group.to_string());
    }
    states
}

/// Apps that carry `state` anywhere, each with the audiences declaring it.
///
/// Apps are ordered by id.
pub fn state_apps<'a>(
    apps: &'a AppIndex,
    entitlements: &'a EntitlementIndex,
    state: &str,
) -> Vec<StateApp<'a>> {
    let mut by_app: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();
    for (app_id, key, entitlement) in entitlements.entries() {
        if entitlement.state_or_unspecified() == state {
            by_app
                .entry(app_id.as_str())
                .or_default()
                .insert(key.audience_group());
        }
    }
    by_app
        .into_iter()
        .map(|(app_id, audiences)| StateApp {
            app_id,
            definition: apps.representative(app_id),
            audiences: audiences.into_iter().collect(),
        })
        .collect()
}

/// Every defined app, apps with entitlements first, then by display name.
pub fn list_apps<'a>(apps: &'a AppIndex, entitlements: &EntitlementIndex) -> Vec<AppListing<'a>> {
    let mut listing: Vec<AppListing<'a>> = apps
        .iter()
        .filter_map(|(app_id, audiences)| {
            let (_, definition) = audiences.first()?;
            Some(AppListing {
                app_id,
                definition,
                audience_count: audiences.len(),
                has_entitlements: entitlements.contains_app(app_id),
            })
        })
        .collect();
    listing.sort_by(|a, b| {
        b.has_entitlements.cmp(&a.has_entitlements).then_with(|| {
            let name = |l: &AppListing<'_>| l.definition.display_name().to_lowercase();
            name(a).cmp(&name(b))
        })
    });
    listing
}
