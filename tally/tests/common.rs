#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tally::client::TallyClient;
use tally::collaborators::{
    Collaborators, ConsentChangeReason, ConsentProvider, RemoteConfigProvider,
    RequestQueueProvider, SessionProvider,
};
use tally::primitives::config::ClientConfig;
use tally::storage::{
    DeviceKeyValueStore, KeyValueStoreError, StateStore, DEVICE_ID_KEY, DEVICE_ID_TYPE_KEY,
    REMOTE_CONFIG_KEY, REQUEST_QUEUE_KEY, SCHEMA_VERSION_KEY,
};

/// Host key-value store kept in memory
#[derive(Default)]
pub struct MemoryKvStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn state(self: &Arc<Self>) -> StateStore {
        StateStore::new(self.clone())
    }
}

impl DeviceKeyValueStore for MemoryKvStore {
    fn get(&self, key: String) -> Result<String, KeyValueStoreError> {
        self.raw(&key).ok_or(KeyValueStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<(), KeyValueStoreError> {
        self.values.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: String) -> Result<(), KeyValueStoreError> {
        self.values
            .lock()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or(KeyValueStoreError::KeyNotFound)
    }
}

/// Persisted state the way an older client version left it
#[derive(Default)]
pub struct LegacyState<'a> {
    pub schema_version: Option<i32>,
    pub device_id: Option<&'a str>,
    pub device_id_type: Option<&'a str>,
    pub remote_config: Option<&'a str>,
    pub requests: &'a [&'a str],
}

impl LegacyState<'_> {
    pub fn write_to(&self, kv: &MemoryKvStore) {
        if let Some(version) = self.schema_version {
            kv.put(SCHEMA_VERSION_KEY, &version.to_string());
        }
        if let Some(device_id) = self.device_id {
            kv.put(DEVICE_ID_KEY, device_id);
        }
        if let Some(label) = self.device_id_type {
            kv.put(DEVICE_ID_TYPE_KEY, label);
        }
        if let Some(blob) = self.remote_config {
            kv.put(REMOTE_CONFIG_KEY, blob);
        }
        if !self.requests.is_empty() {
            kv.put(
                REQUEST_QUEUE_KEY,
                &serde_json::to_string(self.requests).unwrap(),
            );
        }
    }
}

/// Everything the host was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    RemoveConsent,
    ClearRemoteConfig,
    RefreshRemoteConfig,
    AttemptFlush,
    SendPendingEvents,
    Merge { old: String, new: String },
    EndSession(Option<String>),
}

pub struct FakeHost {
    consent_given: bool,
    calls: Mutex<Vec<HostCall>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            consent_given: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            consent: self.clone(),
            remote_config: self.clone(),
            request_queue: self.clone(),
            sessions: self.clone(),
        }
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ConsentProvider for FakeHost {
    fn any_consent_given(&self) -> bool {
        self.consent_given
    }

    fn remove_all_consent(&self, _reason: ConsentChangeReason) {
        self.record(HostCall::RemoveConsent);
    }
}

impl RemoteConfigProvider for FakeHost {
    fn clear_cache(&self) {
        self.record(HostCall::ClearRemoteConfig);
    }

    fn refresh(&self) {
        self.record(HostCall::RefreshRemoteConfig);
    }
}

impl RequestQueueProvider for FakeHost {
    fn attempt_flush(&self) {
        self.record(HostCall::AttemptFlush);
    }

    fn send_pending_events(&self) {
        self.record(HostCall::SendPendingEvents);
    }

    fn change_device_id_with_merge(
        &self,
        old_device_id: String,
        new_device_id: String,
        _session_duration_seconds: i64,
    ) {
        self.record(HostCall::Merge {
            old: old_device_id,
            new: new_device_id,
        });
    }
}

impl SessionProvider for FakeHost {
    fn end_session(&self, device_id: Option<String>) {
        self.record(HostCall::EndSession(device_id));
    }

    fn seconds_since_last_duration_update(&self) -> i64 {
        0
    }
}

/// Starts a client the way a host app does, through the exported constructor
pub fn start_client(
    kv: &Arc<MemoryKvStore>,
    host: &Arc<FakeHost>,
    config: ClientConfig,
) -> anyhow::Result<Arc<TallyClient>> {
    Ok(TallyClient::start(
        kv.clone(),
        config,
        host.clone(),
        host.clone(),
        host.clone(),
        host.clone(),
    )?)
}
