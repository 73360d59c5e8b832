//! Loader settings: where the catalog configs live and which audiences to load.

use std::path::Path;
use std::time::Duration;

use catalog_core::{DEFAULT_AUDIENCE_GROUP, DEFAULT_AUDIENCE_GROUPS};
use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// Public catalog configuration endpoint.
pub const DEFAULT_CONFIG_ENDPOINT: &str =
    "https://config.edge.skype.com/config/v1/MicrosoftTeams/1.0.0.0?agents=MicrosoftTeamsAppCatalog";

/// Query parameter carrying the audience group on config requests.
pub const AUDIENCE_GROUP_PARAM: &str = "AudienceGroup";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for one catalog session.
///
/// Every field has a default, so a settings file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    /// Config endpoint URL, including any fixed query string.
    pub config_endpoint: String,
    /// Audience group requested without the audience parameter.
    pub default_audience_group: String,
    /// Audience groups to load, in request order.
    pub audience_groups: Vec<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            config_endpoint: DEFAULT_CONFIG_ENDPOINT.to_string(),
            default_audience_group: DEFAULT_AUDIENCE_GROUP.to_string(),
            audience_groups: DEFAULT_AUDIENCE_GROUPS.iter().map(|g| g.to_string()).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl CatalogSettings {
    /// Read settings from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Config URL for one audience group.
    ///
    /// The default group gets the bare endpoint; every other group appends
    /// `AudienceGroup=<group>` to the query string.
    pub fn config_url(&self, audience_group: &str) -> String {
        let endpoint = self.config_endpoint.trim_end_matches(['?', '&']);
        if audience_group == self.default_audience_group {
            return endpoint.to_string();
        }
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        format!("{endpoint}{separator}{AUDIENCE_GROUP_PARAM}={audience_group}")
    }
}
