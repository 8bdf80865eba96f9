use std::sync::Arc;

use super::key_value_store::{namespaced_key, DeviceKeyValueStore, KeyValueStoreError};

/// Schema version marker.
pub const SCHEMA_VERSION_KEY: &str = "tally.schema_version";
/// Active device identifier.
pub const DEVICE_ID_KEY: &str = "tally.device_id";
/// Stored label of how the active device identifier was obtained.
pub const DEVICE_ID_TYPE_KEY: &str = "tally.device_id_type";
/// JSON array of serialized pending requests, oldest first.
pub const REQUEST_QUEUE_KEY: &str = "tally.request_queue";
/// Serialized remote-config value store.
pub const REMOTE_CONFIG_KEY: &str = "tally.remote_config";

/// Typed view of the persisted client state.
///
/// Every accessor maps a missing key to `None` (or an empty queue); any other
/// [`KeyValueStoreError`] is returned to the caller. Structural problems in stored values
/// (a version that is not an integer, a queue that is not a JSON array) are logged and
/// read as absent.
///
/// Callers are expected to serialize access: nothing here guards a read-modify-write
/// sequence against a concurrent writer.
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn DeviceKeyValueStore>,
}

impl StateStore {
    /// Wraps the host store.
    #[must_use]
    pub fn new(kv: Arc<dyn DeviceKeyValueStore>) -> Self {
        Self { kv }
    }

    /// Stored schema version, `None` when no marker was ever written.
    ///
    /// # Errors
    /// Propagates store failures other than a missing key.
    pub fn schema_version(&self) -> Result<Option<i32>, KeyValueStoreError> {
        let Some(raw) = self.get(SCHEMA_VERSION_KEY)? else {
            return Ok(None);
        };
        match raw.trim().parse::<i32>() {
            Ok(version) => Ok(Some(version)),
            Err(e) => {
                crate::warn!("storage.schema_version_unparsable value={raw:?} error={e}");
                Ok(None)
            }
        }
    }

    /// Overwrites the schema version marker.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn set_schema_version(&self, version: i32) -> Result<(), KeyValueStoreError> {
        self.kv
            .set(SCHEMA_VERSION_KEY.to_string(), version.to_string())
    }

    /// Whether this install has persisted anything at all.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn anything_stored(&self) -> Result<bool, KeyValueStoreError> {
        for key in [
            SCHEMA_VERSION_KEY,
            DEVICE_ID_KEY,
            DEVICE_ID_TYPE_KEY,
            REMOTE_CONFIG_KEY,
        ] {
            if self.get(key)?.is_some() {
                return Ok(true);
            }
        }
        Ok(!self.requests()?.is_empty())
    }

    /// Active device identifier.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn device_id(&self) -> Result<Option<String>, KeyValueStoreError> {
        self.get(DEVICE_ID_KEY)
    }

    /// Sets or clears the active device identifier.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn set_device_id(&self, device_id: Option<&str>) -> Result<(), KeyValueStoreError> {
        self.put_or_delete(DEVICE_ID_KEY, device_id)
    }

    /// Raw stored identifier type label.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn device_id_type(&self) -> Result<Option<String>, KeyValueStoreError> {
        self.get(DEVICE_ID_TYPE_KEY)
    }

    /// Sets or clears the identifier type label.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn set_device_id_type(&self, label: Option<&str>) -> Result<(), KeyValueStoreError> {
        self.put_or_delete(DEVICE_ID_TYPE_KEY, label)
    }

    /// Pending requests, oldest first.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn requests(&self) -> Result<Vec<String>, KeyValueStoreError> {
        let Some(raw) = self.get(REQUEST_QUEUE_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(requests) => Ok(requests),
            Err(e) => {
                crate::warn!("storage.request_queue_unparsable error={e}");
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the whole queue with a single write.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn replace_requests(&self, requests: &[String]) -> Result<(), KeyValueStoreError> {
        let json =
            serde_json::to_string(requests).map_err(|_| KeyValueStoreError::ParsingFailure)?;
        self.kv.set(REQUEST_QUEUE_KEY.to_string(), json)
    }

    /// Appends one serialized request to the end of the queue.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn add_request(&self, request: &str) -> Result<(), KeyValueStoreError> {
        let mut requests = self.requests()?;
        requests.push(request.to_string());
        self.replace_requests(&requests)
    }

    /// Serialized remote-config values.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn remote_config_blob(&self) -> Result<Option<String>, KeyValueStoreError> {
        self.get(REMOTE_CONFIG_KEY)
    }

    /// Overwrites the serialized remote-config values.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn set_remote_config_blob(&self, blob: &str) -> Result<(), KeyValueStoreError> {
        self.kv.set(REMOTE_CONFIG_KEY.to_string(), blob.to_string())
    }

    /// Deletes `key` from a secondary legacy namespace. Missing keys are not an error.
    ///
    /// # Errors
    /// Propagates store failures other than a missing key.
    pub fn delete_legacy_preference_key(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<(), KeyValueStoreError> {
        match self.kv.delete(namespaced_key(namespace, key)) {
            Ok(()) | Err(KeyValueStoreError::KeyNotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        match self.kv.get(key.to_string()) {
            Ok(value) => Ok(Some(value)),
            Err(KeyValueStoreError::KeyNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put_or_delete(&self, key: &str, value: Option<&str>) -> Result<(), KeyValueStoreError> {
        match value {
            Some(value) => self.kv.set(key.to_string(), value.to_string()),
            None => match self.kv.delete(key.to_string()) {
                Ok(()) | Err(KeyValueStoreError::KeyNotFound) => Ok(()),
                Err(e) => Err(e),
            },
        }
    }
}
