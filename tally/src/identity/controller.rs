use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::collaborators::{Collaborators, ConsentChangeReason};
use crate::device_id::{DeviceIdType, DeviceIdentity, StartupPlan, TEMPORARY_DEVICE_ID};
use crate::identity::DeviceIdError;
use crate::storage::{KeyValueStoreError, StateStore};

/// What an identity change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum IdChangeOutcome {
    /// A new identifier is active; nothing was merged.
    Changed,
    /// The temporary placeholder is active.
    EnteredTemporaryMode,
    /// The placeholder was replaced by a real identifier, in the store and in queued
    /// requests.
    ExitedTemporaryMode,
    /// A new identifier is active and the host queued a profile merge.
    MergeRequested,
    /// The request changed nothing (already in the requested state).
    Ignored,
}

/// Snapshot of identity state taken at the start of a change.
struct IdentityState {
    current_id: Option<String>,
    temporary: bool,
    queue_has_temporary_items: bool,
}

impl IdentityState {
    /// Temporary mode is active, or an earlier exit left placeholder-tagged requests.
    const fn temporary_conditions(&self) -> bool {
        self.temporary || self.queue_has_temporary_items
    }
}

/// Owns the active device identifier after start-up.
///
/// # Examples
///
/// ```swift
/// let ids = client.deviceIdController()
/// try ids.enableTemporaryIdMode()
/// // ...the user logs in
/// try ids.changeWithMerge(deviceId: "user-1234")
/// ```
#[derive(uniffi::Object)]
pub struct DeviceIdController {
    identity: Mutex<DeviceIdentity>,
    change_lock: Mutex<()>,
    collaborators: Collaborators,
    remote_config_automatic_refresh: bool,
}

#[crate::tally_export]
impl DeviceIdController {
    /// The active device identifier.
    ///
    /// # Errors
    /// `DeviceIdError::KeyValueStore` if the host store fails.
    pub fn device_id(&self) -> Result<Option<String>, DeviceIdError> {
        Ok(self.with_identity(DeviceIdentity::current_id)?)
    }

    /// How the active identifier was obtained.
    ///
    /// # Errors
    /// `DeviceIdError::KeyValueStore` if the host store fails.
    pub fn device_id_type(&self) -> Result<Option<DeviceIdType>, DeviceIdError> {
        Ok(self.with_identity(DeviceIdentity::id_type)?)
    }

    /// Whether the temporary placeholder is active.
    ///
    /// # Errors
    /// `DeviceIdError::KeyValueStore` if the host store fails.
    pub fn is_temporary(&self) -> Result<bool, DeviceIdError> {
        Ok(self.with_identity(DeviceIdentity::is_temporary)?)
    }

    /// Whether any queued request is still tagged with the temporary placeholder.
    ///
    /// # Errors
    /// `DeviceIdError::KeyValueStore` if the host store fails.
    pub fn queue_contains_temporary_items(&self) -> Result<bool, DeviceIdError> {
        Ok(self.with_identity(|identity| identity.queue().contains_temporary_items())?)
    }

    /// Switch to `device_id` as a new user, without merging the old profile.
    ///
    /// Pending events are sent under the old identifier, the session is ended and all
    /// consent is removed before the new identifier is stored. Passing the temporary
    /// placeholder enters temporary mode. In temporary mode (or with placeholder-tagged
    /// requests still queued) the placeholder is first replaced by `device_id`.
    ///
    /// # Errors
    /// - `DeviceIdError::EmptyDeviceId` if `device_id` is empty
    /// - `DeviceIdError::KeyValueStore` if the host store fails
    pub fn change_without_merge(
        &self,
        device_id: String,
    ) -> Result<IdChangeOutcome, DeviceIdError> {
        if device_id.is_empty() {
            crate::error!("device_id.change_rejected merge=false reason=empty_device_id");
            return Err(DeviceIdError::EmptyDeviceId);
        }

        let _change = self.lock_changes();
        let state = self.snapshot()?;
        let entering_temporary_mode = device_id == TEMPORARY_DEVICE_ID;

        if entering_temporary_mode && state.temporary {
            crate::info!("device_id.change_ignored merge=false reason=already_temporary");
            return Ok(IdChangeOutcome::Ignored);
        }
        if state.current_id.as_deref() == Some(device_id.as_str()) {
            crate::warn!("device_id.change_ignored merge=false reason=same_device_id");
            return Ok(IdChangeOutcome::Ignored);
        }

        let mut outcome = if entering_temporary_mode {
            IdChangeOutcome::EnteredTemporaryMode
        } else {
            IdChangeOutcome::Changed
        };
        let exiting_temporary_mode = state.temporary_conditions() && !entering_temporary_mode;
        if exiting_temporary_mode {
            self.exit_temporary_mode_to(&device_id)?;
            outcome = IdChangeOutcome::ExitedTemporaryMode;
        }

        self.collaborators.request_queue.send_pending_events();
        if !exiting_temporary_mode {
            self.collaborators
                .reset_remote_config(self.remote_config_automatic_refresh);
        }
        // after an exit the session ends under the new id; the placeholder is gone by then
        let session_device_id = if exiting_temporary_mode {
            Some(device_id.clone())
        } else {
            state.current_id
        };
        self.collaborators.sessions.end_session(session_device_id);
        self.collaborators
            .consent
            .remove_all_consent(ConsentChangeReason::DeviceIdChangedNotMerged);

        self.with_identity(|identity| {
            if entering_temporary_mode {
                identity.enter_temporary_mode()
            } else {
                identity.change_to_custom_id(&device_id)
            }
        })?;

        crate::info!("device_id.changed merge=false outcome={outcome:?}");
        Ok(outcome)
    }

    /// Switch to `device_id` and have the server merge the old profile into it.
    ///
    /// In temporary mode (or with placeholder-tagged requests still queued) there is no
    /// old profile to merge: the placeholder is replaced by `device_id` instead.
    ///
    /// # Errors
    /// - `DeviceIdError::EmptyDeviceId` if `device_id` is empty
    /// - `DeviceIdError::NotInitialized` if there is no identifier to merge from
    /// - `DeviceIdError::KeyValueStore` if the host store fails
    pub fn change_with_merge(
        &self,
        device_id: String,
    ) -> Result<IdChangeOutcome, DeviceIdError> {
        if device_id.is_empty() {
            crate::error!("device_id.change_rejected merge=true reason=empty_device_id");
            return Err(DeviceIdError::EmptyDeviceId);
        }

        let _change = self.lock_changes();
        let state = self.snapshot()?;

        if state.temporary_conditions() {
            if device_id == TEMPORARY_DEVICE_ID {
                crate::warn!("device_id.change_ignored merge=true reason=already_temporary");
                return Ok(IdChangeOutcome::Ignored);
            }
            self.exit_temporary_mode_to(&device_id)?;
            crate::info!("device_id.changed merge=true outcome=ExitedTemporaryMode");
            return Ok(IdChangeOutcome::ExitedTemporaryMode);
        }

        if device_id == TEMPORARY_DEVICE_ID {
            crate::warn!("device_id.change_ignored merge=true reason=placeholder_not_mergeable");
            return Ok(IdChangeOutcome::Ignored);
        }
        let Some(old_device_id) = state.current_id else {
            crate::error!("device_id.change_rejected merge=true reason=no_device_id");
            return Err(DeviceIdError::NotInitialized);
        };
        if old_device_id == device_id {
            crate::warn!("device_id.change_ignored merge=true reason=same_device_id");
            return Ok(IdChangeOutcome::Ignored);
        }

        self.with_identity(|identity| identity.change_to_custom_id(&device_id))?;
        self.collaborators
            .reset_remote_config(self.remote_config_automatic_refresh);
        let session_duration_seconds = self
            .collaborators
            .sessions
            .seconds_since_last_duration_update();
        self.collaborators.request_queue.change_device_id_with_merge(
            old_device_id,
            device_id,
            session_duration_seconds,
        );

        crate::info!("device_id.changed merge=true outcome=MergeRequested");
        Ok(IdChangeOutcome::MergeRequested)
    }

    /// Enter temporary mode; same as `change_without_merge` with the placeholder.
    ///
    /// # Errors
    /// `DeviceIdError::KeyValueStore` if the host store fails.
    pub fn enable_temporary_id_mode(&self) -> Result<IdChangeOutcome, DeviceIdError> {
        self.change_without_merge(TEMPORARY_DEVICE_ID.to_string())
    }

    /// Replace the temporary placeholder with `device_id` everywhere.
    ///
    /// Stores `device_id` as developer supplied, rewrites placeholder-tagged requests, resets
    /// remote config and starts sending the queue. No session or consent change happens.
    /// Outside temporary mode, with no placeholder-tagged requests queued, nothing changes;
    /// use `change_without_merge` or `change_with_merge` to switch users.
    ///
    /// # Errors
    /// - `DeviceIdError::EmptyDeviceId` if `device_id` is empty
    /// - `DeviceIdError::KeyValueStore` if the host store fails
    pub fn exit_temporary_mode(
        &self,
        device_id: String,
    ) -> Result<IdChangeOutcome, DeviceIdError> {
        if device_id.is_empty() {
            crate::error!("device_id.exit_temporary_rejected reason=empty_device_id");
            return Err(DeviceIdError::EmptyDeviceId);
        }
        if device_id == TEMPORARY_DEVICE_ID {
            crate::warn!("device_id.exit_temporary_ignored reason=placeholder_requested");
            return Ok(IdChangeOutcome::Ignored);
        }

        let _change = self.lock_changes();
        if !self.snapshot()?.temporary_conditions() {
            crate::warn!("device_id.exit_temporary_ignored reason=not_temporary");
            return Ok(IdChangeOutcome::Ignored);
        }
        self.exit_temporary_mode_to(&device_id)?;
        Ok(IdChangeOutcome::ExitedTemporaryMode)
    }
}

impl DeviceIdController {
    /// Controller over `store`, notifying `collaborators` of changes.
    #[must_use]
    pub fn new(
        store: StateStore,
        collaborators: Collaborators,
        remote_config_automatic_refresh: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            identity: Mutex::new(DeviceIdentity::new(store)),
            change_lock: Mutex::new(()),
            collaborators,
            remote_config_automatic_refresh,
        })
    }

    /// Last part of start-up, once migrations ran.
    ///
    /// Acquires the identifier according to `plan`. A developer identifier supplied while
    /// a stored temporary identity is active then ends temporary mode. Otherwise
    /// placeholder-tagged requests left behind by an earlier run are retagged with the
    /// stored identifier. Returns whether temporary mode is active afterwards.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn finish_startup(&self, plan: &StartupPlan) -> Result<bool, DeviceIdError> {
        let _change = self.lock_changes();
        self.with_identity(|identity| identity.acquire(plan))?;

        if self.with_identity(DeviceIdentity::is_temporary)? {
            let developer_id = plan
                .provided_id
                .as_deref()
                .filter(|_| plan.custom_id_provided);
            if let Some(device_id) = developer_id {
                crate::info!("device_id.startup exiting_temporary_mode");
                self.exit_temporary_mode_to(device_id)?;
                return Ok(false);
            }
            return Ok(true);
        }

        let retagged = self.with_identity(|identity| -> Result<_, KeyValueStoreError> {
            let Some(device_id) = identity.current_id()?.filter(|id| !id.is_empty()) else {
                return Ok(None);
            };
            identity
                .queue()
                .replace_device_id_tag(TEMPORARY_DEVICE_ID, &device_id)
                .map(Some)
        })?;

        match retagged {
            Some(0) => {}
            Some(count) => {
                crate::info!("device_id.startup retagged_temporary_requests count={count}");
            }
            None => crate::warn!("device_id.startup queue_cleanup_skipped reason=no_device_id"),
        }
        Ok(false)
    }

    fn exit_temporary_mode_to(&self, device_id: &str) -> Result<(), DeviceIdError> {
        let retagged = self.with_identity(|identity| {
            identity.change_to_custom_id(device_id)?;
            identity
                .queue()
                .replace_device_id_tag(TEMPORARY_DEVICE_ID, device_id)
        })?;
        crate::info!("device_id.exited_temporary_mode retagged_requests={retagged}");

        self.collaborators
            .reset_remote_config(self.remote_config_automatic_refresh);
        self.collaborators.request_queue.attempt_flush();
        Ok(())
    }

    fn snapshot(&self) -> Result<IdentityState, KeyValueStoreError> {
        self.with_identity(|identity| {
            Ok(IdentityState {
                current_id: identity.current_id()?,
                temporary: identity.is_temporary()?,
                queue_has_temporary_items: identity.queue().contains_temporary_items()?,
            })
        })
    }

    fn with_identity<T>(&self, f: impl FnOnce(&DeviceIdentity) -> T) -> T {
        let identity = self.identity.lock().unwrap_or_else(PoisonError::into_inner);
        f(&identity)
    }

    fn lock_changes(&self) -> MutexGuard<'_, ()> {
        self.change_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
