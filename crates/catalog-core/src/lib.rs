//! Core types shared by the catalog explorer crates: app definitions,
//! preconfigured entitlements, audience groups and the ordered map used by
//! the aggregated indices.

pub mod app;
pub mod audience;
pub mod entitlement;
pub mod ordered;
pub mod source;
pub mod version;

pub use app::{AppDefinition, UNKNOWN_APP, UNKNOWN_DEVELOPER};
pub use audience::{
    AudienceGroup, DEFAULT_AUDIENCE_GROUP, DEFAULT_AUDIENCE_GROUPS, audience_shorthand,
    reseed_selection,
};
pub use entitlement::{
    Entitlement, EntitlementKey, KNOWN_STATES, UNSPECIFIED_STATE, state_description,
};
pub use ordered::OrderedMap;
pub use source::{SourceCategory, SourceType};
pub use version::compare_versions;

/// Opaque application identifier as it appears in catalog documents.
pub type AppId = String;

/// Read an identifier-like field from a JSON object.
///
/// Non-empty strings are returned as-is and numbers are stringified. Anything
/// else (missing, null, empty string, objects) yields `None`.
pub fn id_field(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
