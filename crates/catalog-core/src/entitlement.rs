//! Preconfigured entitlements: declared app states per audience, scope and context.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// State bucket for entitlement records that carry no `state`.
pub const UNSPECIFIED_STATE: &str = "Unspecified";

/// Entitlement states seen in published catalogs, with a one-line meaning.
///
/// The state set is open: records with other states are kept and analysed
/// like any other.
pub const KNOWN_STATES: &[(&str, &str)] = &[
    ("Installed", "Installed for users in scope"),
    ("InstalledAndPermanent", "Installed and cannot be uninstalled"),
    ("InstalledAndDeprecated", "Installed but scheduled for removal"),
    ("NotInstalled", "Available but not installed"),
    ("PreConsented", "Permissions consented on behalf of users"),
    ("Preinstalled", "Installed ahead of first use"),
    ("Featured", "Promoted in the app store"),
    ("HiddenFromAppStore", "Not listed in the app store"),
    ("Available", "Listed and installable"),
    ("Blocked", "Blocked for users in scope"),
    ("BlockedByAdmin", "Blocked by a tenant administrator"),
    ("BlockedByUser", "Blocked by the user"),
    ("Pinned", "Pinned to the app bar"),
];

/// Description of a known state, if any.
pub fn state_description(state: &str) -> Option<&'static str> {
    KNOWN_STATES
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, description)| *description)
}

/// Inner key of the entitlement index: `audienceGroup.scope.context`.
///
/// Scope and context are free-form and may themselves contain dots; only the
/// audience group (text before the first `.`) is ever parsed back out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitlementKey(String);

impl EntitlementKey {
    pub fn new(audience_group: &str, scope: &str, context: &str) -> Self {
        Self(format!("{audience_group}.{scope}.{context}"))
    }

    /// Audience group prefix of the key.
    pub fn audience_group(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntitlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntitlementKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::borrow::Borrow<str> for EntitlementKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One preconfigured-state record for one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    /// Resolved from the record's `id`, else its `appId`.
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub scope: String,
    pub context: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entitlement {
    /// Build an entitlement from one element of
    /// `value.appEntitlements[scope][context]`.
    ///
    /// Returns `None` for null elements and for records with neither `id` nor
    /// `appId`. Numeric and boolean states are read as their JSON text.
    pub fn from_record(record: &Value, scope: &str, context: &str) -> Option<Self> {
        let app_id = crate::id_field(record, "id").or_else(|| crate::id_field(record, "appId"))?;
        let mut fields = record.as_object()?.clone();
        fields.shift_remove("appId");
        fields.shift_remove("scope");
        fields.shift_remove("context");
        // Structured states are not analysable and stay in `extra` verbatim.
        let state = match fields.get("state") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        if state.is_some() {
            fields.shift_remove("state");
        }

        Some(Self {
            app_id,
            state,
            scope: scope.to_string(),
            context: context.to_string(),
            extra: fields,
        })
    }

    /// State used for analysis; records without one share a bucket.
    pub fn state_or_unspecified(&self) -> &str {
        self.state.as_deref().unwrap_or(UNSPECIFIED_STATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_layout_and_prefix() {
        let key = EntitlementKey::new("ring0", "tenant", "team");
        assert_eq!(key.as_str(), "ring0.tenant.team");
        assert_eq!(key.audience_group(), "ring0");
    }

    #[test]
    fn key_prefix_with_dotted_scope() {
        let key = EntitlementKey::new("ring3_9", "user.personal", "default");
        assert_eq!(key.audience_group(), "ring3_9");
    }

    #[test]
    fn id_preferred_over_app_id() {
        let e = Entitlement::from_record(&json!({"id": "a", "appId": "b", "state": "Pinned"}), "tenant", "team")
            .unwrap();
        assert_eq!(e.app_id, "a");
        assert_eq!(e.state.as_deref(), Some("Pinned"));
        assert_eq!(e.scope, "tenant");
        assert_eq!(e.context, "team");
        assert_eq!(e.extra.get("id"), Some(&json!("a")));
    }

    #[test]
    fn app_id_fallback() {
        let e = Entitlement::from_record(&json!({"appId": "legacy", "state": "Installed"}), "user", "default")
            .unwrap();
        assert_eq!(e.app_id, "legacy");
        let out = serde_json::to_value(&e).unwrap();
        assert_eq!(out["appId"], "legacy");
    }

    #[test]
    fn unresolvable_records_are_skipped() {
        assert!(Entitlement::from_record(&json!({}), "s", "c").is_none());
        assert!(Entitlement::from_record(&json!({"state": "Installed"}), "s", "c").is_none());
        assert!(Entitlement::from_record(&json!(null), "s", "c").is_none());
        assert!(Entitlement::from_record(&json!(false), "s", "c").is_none());
    }

    #[test]
    fn missing_state_is_unspecified() {
        let e = Entitlement::from_record(&json!({"id": "a"}), "s", "c").unwrap();
        assert_eq!(e.state_or_unspecified(), UNSPECIFIED_STATE);
    }

    #[test]
    fn scalar_states_are_stringified() {
        let numeric = Entitlement::from_record(&json!({"id": "a", "state": 3}), "s", "c").unwrap();
        assert_eq!(numeric.state_or_unspecified(), "3");
        assert!(!numeric.extra.contains_key("state"));

        let flag = Entitlement::from_record(&json!({"id": "a", "state": true}), "s", "c").unwrap();
        assert_eq!(flag.state.as_deref(), Some("true"));
    }

    #[test]
    fn structured_state_stays_in_extra() {
        let e = Entitlement::from_record(&json!({"id": "a", "state": {"v": 1}}), "s", "c").unwrap();
        assert_eq!(e.state_or_unspecified(), UNSPECIFIED_STATE);
        assert_eq!(e.extra.get("state"), Some(&json!({"v": 1})));
    }

    #[test]
    fn known_state_descriptions() {
        assert!(state_description("Pinned").is_some());
        assert!(state_description("SomethingNew").is_none());
    }
}
