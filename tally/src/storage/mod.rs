//! Persisted client state.
//!
//! The host implements [`DeviceKeyValueStore`]; everything else in the crate reads and
//! writes through the typed [`StateStore`] facade built on top of it.

mod key_value_store;
mod state_store;

pub use key_value_store::{namespaced_key, DeviceKeyValueStore, KeyValueStoreError};
pub use state_store::{
    StateStore, DEVICE_ID_KEY, DEVICE_ID_TYPE_KEY, REMOTE_CONFIG_KEY, REQUEST_QUEUE_KEY,
    SCHEMA_VERSION_KEY,
};
