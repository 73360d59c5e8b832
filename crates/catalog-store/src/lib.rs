//! In-memory catalog indices and the views derived from them.
//!
//! [`AppIndex`] holds app definitions keyed by app id then audience group;
//! [`EntitlementIndex`] holds preconfigured entitlements keyed by app id then
//! `audienceGroup.scope.context`. Both are plain data: loading and the
//! cross-index integrity rules live in `catalog-sync`.

mod apps;
mod entitlements;
pub mod stats;
pub mod views;

pub use apps::{AppIndex, AudienceDefinitions, VersionGroup};
pub use entitlements::{AppEntitlements, EntitlementIndex};
pub use stats::CatalogStats;
pub use views::{
    AppListing, StateApp, StateSummary, analyze_entitlement_states,
    analyze_entitlement_states_unfiltered, compute_audience_groups, list_apps, state_apps,
};
