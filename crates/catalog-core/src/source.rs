//! Provenance of catalog source documents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which app-definition list of a catalog config a record came from.
///
/// Declaration order is merge order: for one audience group the categories are
/// loaded store, core, preApproved, override, so a later category's record for
/// the same app replaces an earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceType {
    #[default]
    Store,
    Core,
    PreApproved,
    Override,
}

impl SourceType {
    /// All source types in merge order.
    pub const MERGE_ORDER: [SourceType; 4] = [
        SourceType::Store,
        SourceType::Core,
        SourceType::PreApproved,
        SourceType::Override,
    ];

    /// Wire name, as injected into stored definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Store => "store",
            SourceType::Core => "core",
            SourceType::PreApproved => "preApproved",
            SourceType::Override => "override",
        }
    }

    /// Key of this list under `MicrosoftTeamsAppCatalog.appCatalog`.
    pub fn config_key(self) -> &'static str {
        match self {
            SourceType::Store => "storeAppDefinitions",
            SourceType::Core => "coreAppDefinitions",
            SourceType::PreApproved => "preApprovedAppDefinitions",
            SourceType::Override => "overrideAppDefinitions",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five kinds of source list a catalog config can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    Definitions(SourceType),
    Entitlements,
}

impl SourceCategory {
    /// Every category, definitions in merge order then entitlements.
    pub const ALL: [SourceCategory; 5] = [
        SourceCategory::Definitions(SourceType::Store),
        SourceCategory::Definitions(SourceType::Core),
        SourceCategory::Definitions(SourceType::PreApproved),
        SourceCategory::Definitions(SourceType::Override),
        SourceCategory::Entitlements,
    ];

    pub fn config_key(self) -> &'static str {
        match self {
            SourceCategory::Definitions(source_type) => source_type.config_key(),
            SourceCategory::Entitlements => "preconfiguredAppEntitlements",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceCategory::Definitions(source_type) => write!(f, "{source_type} definitions"),
            SourceCategory::Entitlements => f.write_str("preconfigured entitlements"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_order_is_store_core_preapproved_override() {
        let names: Vec<_> = SourceType::MERGE_ORDER.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["store", "core", "preApproved", "override"]);
        assert!(SourceType::Store < SourceType::Override);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&SourceType::PreApproved).unwrap();
        assert_eq!(json, "\"preApproved\"");
        let parsed: SourceType = serde_json::from_str("\"override\"").unwrap();
        assert_eq!(parsed, SourceType::Override);
    }

    #[test]
    fn category_config_keys() {
        let keys: Vec<_> = SourceCategory::ALL.iter().map(|c| c.config_key()).collect();
        assert_eq!(
            keys,
            vec![
                "storeAppDefinitions",
                "coreAppDefinitions",
                "preApprovedAppDefinitions",
                "overrideAppDefinitions",
                "preconfiguredAppEntitlements",
            ]
        );
    }
}
