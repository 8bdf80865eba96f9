//! The registered upgrade steps, one per schema version.

mod device_id_type;
mod push_mode_cleanup;
mod remote_config;
mod request_queue_device_id;

use std::sync::Arc;

pub use device_id_type::DeviceIdTypeStep;
pub use push_mode_cleanup::{PushModeCleanupStep, LEGACY_PUSH_MODE_KEY, LEGACY_PUSH_NAMESPACE};
pub use remote_config::RemoteConfigStep;
pub use request_queue_device_id::RequestQueueDeviceIdStep;

use crate::migration::MigrationStep;

/// Every step, ordered by the version it upgrades from.
#[must_use]
pub fn default_steps() -> Vec<Arc<dyn MigrationStep>> {
    vec![
        Arc::new(DeviceIdTypeStep),
        Arc::new(RemoteConfigStep),
        Arc::new(PushModeCleanupStep),
        Arc::new(RequestQueueDeviceIdStep),
    ]
}
