//! Host-side modules that identity changes notify.
//!
//! None of these calls return anything the engine waits on: sends and downloads they
//! start are fire-and-forget from the engine's point of view.

use std::sync::Arc;

/// Why consent is being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ConsentChangeReason {
    /// The device identifier changed without merging the old user profile.
    DeviceIdChangedNotMerged,
}

/// Consent bookkeeping of the host.
#[uniffi::export(with_foreign)]
pub trait ConsentProvider: Send + Sync {
    /// Whether any consent feature is currently given.
    fn any_consent_given(&self) -> bool;

    /// Removes every given consent.
    fn remove_all_consent(&self, reason: ConsentChangeReason);
}

/// Remote-config cache of the host.
#[uniffi::export(with_foreign)]
pub trait RemoteConfigProvider: Send + Sync {
    /// Drops cached values downloaded for the previous identity.
    fn clear_cache(&self);

    /// Starts downloading values for the current identity.
    fn refresh(&self);
}

/// Outgoing request queue of the host.
#[uniffi::export(with_foreign)]
pub trait RequestQueueProvider: Send + Sync {
    /// Starts sending whatever is queued.
    fn attempt_flush(&self);

    /// Turns buffered events into queued requests so they are attributed to the
    /// identifier that is active now.
    fn send_pending_events(&self);

    /// Queues the server-side merge of `old_device_id` into `new_device_id`.
    fn change_device_id_with_merge(
        &self,
        old_device_id: String,
        new_device_id: String,
        session_duration_seconds: i64,
    );
}

/// Session tracking of the host.
#[uniffi::export(with_foreign)]
pub trait SessionProvider: Send + Sync {
    /// Ends the running session, attributed to `device_id`.
    fn end_session(&self, device_id: Option<String>);

    /// Whole seconds since the session duration was last reported.
    fn seconds_since_last_duration_update(&self) -> i64;
}

/// The collaborators an identity change talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Consent bookkeeping
    pub consent: Arc<dyn ConsentProvider>,
    /// Remote-config cache
    pub remote_config: Arc<dyn RemoteConfigProvider>,
    /// Outgoing request queue
    pub request_queue: Arc<dyn RequestQueueProvider>,
    /// Session tracking
    pub sessions: Arc<dyn SessionProvider>,
}

impl Collaborators {
    /// Clears cached remote config and, when `automatic_refresh` is on and some consent is
    /// given, downloads it again.
    pub fn reset_remote_config(&self, automatic_refresh: bool) {
        self.remote_config.clear_cache();
        if automatic_refresh && self.consent.any_consent_given() {
            self.remote_config.refresh();
        } else {
            crate::debug!(
                "collaborators.remote_config_refresh_skipped automatic_refresh={automatic_refresh}"
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test::{Call, RecordingHost};

    #[test]
    fn test_refresh_needs_flag_and_consent() {
        let host = RecordingHost::new(true);
        host.collaborators().reset_remote_config(true);
        assert_eq!(
            host.calls(),
            vec![Call::ClearRemoteConfig, Call::RefreshRemoteConfig]
        );

        let host = RecordingHost::new(true);
        host.collaborators().reset_remote_config(false);
        assert_eq!(host.calls(), vec![Call::ClearRemoteConfig]);

        let host = RecordingHost::new(false);
        host.collaborators().reset_remote_config(true);
        assert_eq!(host.calls(), vec![Call::ClearRemoteConfig]);
    }
}
