//! App definitions: one application's metadata as declared for one audience group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::SourceType;

/// Display name used when an app id has no definition.
pub const UNKNOWN_APP: &str = "Unknown App";
/// Developer name used when an app id has no definition.
pub const UNKNOWN_DEVELOPER: &str = "Unknown";

/// An app definition as found in a catalog source's `value.appDefinitions`.
///
/// The fields the explorer reads are typed; every other field of the source
/// record is kept verbatim in `extra` and written back out on serialisation.
/// A known field whose JSON type doesn't match (say, a numeric `version`)
/// stays in `extra` rather than failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_version: Option<String>,
    /// ISO 8601 timestamp string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_core_app: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_teams_owned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinnable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_preinstallable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_blockable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_full_trust: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries: Option<Vec<String>>,
    /// Which definition list this record was merged from.
    #[serde(default)]
    pub source_type: SourceType,
    /// Audience group whose config declared this record.
    #[serde(default)]
    pub audience_group: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppDefinition {
    /// Build a definition from a raw source record, injecting provenance.
    ///
    /// Returns `None` for records without a usable `id`; those are empty
    /// placeholder slots in real catalogs, not errors.
    pub fn from_record(record: &Value, audience_group: &str, source_type: SourceType) -> Option<Self> {
        let id = crate::id_field(record, "id")?;
        let mut fields = record.as_object()?.clone();
        fields.shift_remove("id");
        // Provenance is always ours, never the source's.
        fields.shift_remove("sourceType");
        fields.shift_remove("audienceGroup");

        Some(Self {
            id,
            name: take_string(&mut fields, "name"),
            developer_name: take_string(&mut fields, "developerName"),
            developer_url: take_string(&mut fields, "developerUrl"),
            version: take_string(&mut fields, "version"),
            description: take_string(&mut fields, "description"),
            short_description: take_string(&mut fields, "shortDescription"),
            long_description: take_string(&mut fields, "longDescription"),
            small_image_url: take_string(&mut fields, "smallImageUrl"),
            large_image_url: take_string(&mut fields, "largeImageUrl"),
            office_asset_id: take_string(&mut fields, "officeAssetId"),
            manifest_version: take_string(&mut fields, "manifestVersion"),
            last_updated_at: take_string(&mut fields, "lastUpdatedAt"),
            is_core_app: take_bool(&mut fields, "isCoreApp"),
            is_teams_owned: take_bool(&mut fields, "isTeamsOwned"),
            is_pinnable: take_bool(&mut fields, "isPinnable"),
            is_preinstallable: take_bool(&mut fields, "isPreinstallable"),
            is_blockable: take_bool(&mut fields, "isBlockable"),
            is_full_trust: take_bool(&mut fields, "isFullTrust"),
            categories: take_string_list(&mut fields, "categories"),
            industries: take_string_list(&mut fields, "industries"),
            source_type,
            audience_group: audience_group.to_string(),
            extra: fields,
        })
    }

    /// Placeholder returned for app ids the catalog doesn't define.
    pub fn unknown(app_id: &str) -> Self {
        Self {
            id: app_id.to_string(),
            name: Some(UNKNOWN_APP.to_string()),
            developer_name: Some(UNKNOWN_DEVELOPER.to_string()),
            ..Self::default()
        }
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.id)
    }

    /// Parsed `lastUpdatedAt`, when present and RFC 3339.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_updated_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Labels for the capability flags that are set.
    ///
    /// An app with none of them set is a "Standard App".
    pub fn capability_badges(&self) -> Vec<&'static str> {
        let flags = [
            (self.is_core_app, "Core App"),
            (self.is_teams_owned, "Teams Owned"),
            (self.is_pinnable, "Pinnable"),
            (self.is_preinstallable, "Preinstallable"),
            (self.is_blockable, "Blockable"),
            (self.is_full_trust, "Full Trust"),
        ];
        let badges: Vec<_> = flags
            .into_iter()
            .filter(|(flag, _)| flag.unwrap_or(false))
            .map(|(_, label)| label)
            .collect();
        if badges.is_empty() {
            vec!["Standard App"]
        } else {
            badges
        }
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(_)) => match fields.shift_remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

fn take_bool(fields: &mut Map<String, Value>, key: &str) -> Option<bool> {
    let value = fields.get(key)?.as_bool()?;
    fields.shift_remove(key);
    Some(value)
}

fn take_string_list(fields: &mut Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let items = fields.get(key)?.as_array()?;
    let strings: Option<Vec<String>> = items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect();
    let strings = strings?;
    fields.shift_remove(key);
    Some(strings)
}
