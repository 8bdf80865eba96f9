//! Rewriting of the `device_id` parameter inside queued requests.
//!
//! Queued requests are opaque `key=value&key=value` strings. The only parameter this
//! crate looks at is `device_id`, and it is rewritten by literal substring replacement
//! so that everything else in the entry stays byte-for-byte identical. Every operation
//! keeps the queue order and writes the queue back with a single store write.

use crate::device_id::TEMPORARY_DEVICE_ID;
use crate::storage::{KeyValueStoreError, StateStore};

/// Query parameter carrying the device identifier.
pub const DEVICE_ID_PARAM: &str = "device_id";

/// The `&device_id=<value>` tag searched for and substituted in queued requests.
#[must_use]
pub fn device_id_tag(value: &str) -> String {
    format!("&{DEVICE_ID_PARAM}={value}")
}

/// Replaces `&device_id=<old_value>` with `&device_id=<new_value>` in every entry.
///
/// Entries without the tag, and the order of entries, are unchanged.
#[must_use]
pub fn replace_tag(queue: &[String], old_value: &str, new_value: &str) -> Vec<String> {
    let old_tag = device_id_tag(old_value);
    let new_tag = device_id_tag(new_value);
    queue
        .iter()
        .map(|request| {
            if request.contains(&old_tag) {
                request.replace(&old_tag, &new_tag)
            } else {
                request.clone()
            }
        })
        .collect()
}

/// Whether `request` has a `device_id` parameter at any position.
#[must_use]
pub fn has_device_id_param(request: &str) -> bool {
    request.split('&').any(|param| {
        param
            .split_once('=')
            .map_or(param, |(key, _)| key)
            == DEVICE_ID_PARAM
    })
}

/// Appends `device_id=<device_id>` to every entry that has no `device_id` parameter.
#[must_use]
pub fn backfill_device_id(queue: &[String], device_id: &str) -> Vec<String> {
    queue
        .iter()
        .map(|request| {
            if has_device_id_param(request) {
                request.clone()
            } else if request.is_empty() {
                format!("{DEVICE_ID_PARAM}={device_id}")
            } else {
                format!("{request}{}", device_id_tag(device_id))
            }
        })
        .collect()
}

/// Whether any entry is still tagged with the temporary placeholder.
#[must_use]
pub fn contains_temporary_items(queue: &[String]) -> bool {
    let temporary_tag = device_id_tag(TEMPORARY_DEVICE_ID);
    queue.iter().any(|request| request.contains(&temporary_tag))
}

/// Read-compute-replace operations on the persisted queue.
pub struct QueueRewriter<'a> {
    store: &'a StateStore,
}

impl<'a> QueueRewriter<'a> {
    /// Operates on the queue of `store`.
    #[must_use]
    pub const fn new(store: &'a StateStore) -> Self {
        Self { store }
    }

    /// Applies [`replace_tag`] to the persisted queue. Returns the number of rewritten
    /// entries; nothing is written when it is zero.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn replace_device_id_tag(
        &self,
        old_value: &str,
        new_value: &str,
    ) -> Result<usize, KeyValueStoreError> {
        let requests = self.store.requests()?;
        let rewritten = replace_tag(&requests, old_value, new_value);
        self.write_if_changed(&requests, &rewritten)
    }

    /// Applies [`backfill_device_id`] to the persisted queue. Returns the number of
    /// entries that received a tag.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn backfill_device_id(&self, device_id: &str) -> Result<usize, KeyValueStoreError> {
        let requests = self.store.requests()?;
        let backfilled = backfill_device_id(&requests, device_id);
        self.write_if_changed(&requests, &backfilled)
    }

    /// Whether the persisted queue still holds placeholder-tagged entries.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn contains_temporary_items(&self) -> Result<bool, KeyValueStoreError> {
        Ok(contains_temporary_items(&self.store.requests()?))
    }

    fn write_if_changed(
        &self,
        before: &[String],
        after: &[String],
    ) -> Result<usize, KeyValueStoreError> {
        let changed = before
            .iter()
            .zip(after)
            .filter(|(old, new)| old != new)
            .count();
        if changed > 0 {
            self.store.replace_requests(after)?;
        }
        Ok(changed)
    }
}
