//! Remote-config value records.
//!
//! Two on-disk layouts exist. The legacy one is a flat JSON object mapping each key to its
//! raw value. The current one wraps every value in a record tagged with whether it
//! belongs to the current user:
//!
//! ```json
//! {"a": {"value": 123, "isCurrentUsersData": true}}
//! ```

use std::collections::BTreeMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tally_error::AnyhowErrorExt;

/// A remote-config value together with its ownership flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfigValueRecord {
    /// The value as downloaded: number, string, array or object.
    pub value: Value,
    /// Whether the value was downloaded for the identity that is currently active.
    #[serde(rename = "isCurrentUsersData")]
    pub is_current_users_data: bool,
}

/// Remote-config values by key, in the current serialized layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteConfigValueStore {
    values: BTreeMap<String, RemoteConfigValueRecord>,
}

impl RemoteConfigValueStore {
    /// Converts a legacy blob. Every value is kept as-is and marked as the current user's.
    ///
    /// Absent, empty and malformed blobs all convert to an empty store; malformed ones are
    /// logged.
    #[must_use]
    pub fn from_legacy_blob(blob: Option<&str>) -> Self {
        let Some(raw) = blob.filter(|raw| !raw.trim().is_empty()) else {
            return Self::default();
        };

        match Self::parse_legacy(raw) {
            Ok(store) => store,
            Err(e) => {
                crate::warn!(
                    "remote_config.legacy_blob_discarded error={}",
                    e.to_generic_message()
                );
                Self::default()
            }
        }
    }

    fn parse_legacy(raw: &str) -> anyhow::Result<Self> {
        let flat: serde_json::Map<String, Value> =
            serde_json::from_str(raw).context("legacy remote config is not a JSON object")?;

        let values = flat
            .into_iter()
            .map(|(key, value)| {
                (
                    key,
                    RemoteConfigValueRecord {
                        value,
                        is_current_users_data: true,
                    },
                )
            })
            .collect();

        Ok(Self { values })
    }

    /// Parses a blob that is already in the current layout, `None` otherwise.
    #[must_use]
    pub fn parse_current(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Serializes into the current layout.
    ///
    /// # Errors
    /// Fails only if a value cannot be represented as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Record stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RemoteConfigValueRecord> {
        self.values.get(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
