use crate::migration::{MigrationResult, MigrationStep};
use crate::primitives::config::MigrationParams;
use crate::storage::StateStore;

/// Legacy namespace the push messaging module used to keep its preferences in.
pub const LEGACY_PUSH_NAMESPACE: &str = "push_messaging";

/// Cached push messaging mode, no longer read by anything.
pub const LEGACY_PUSH_MODE_KEY: &str = "PUSH_MESSAGING_MODE";

/// 2 → 3: deletes the cached push messaging mode.
pub struct PushModeCleanupStep;

impl MigrationStep for PushModeCleanupStep {
    fn from_version(&self) -> i32 {
        2
    }

    fn name(&self) -> &'static str {
        "push_mode_cleanup"
    }

    fn apply(&self, store: &StateStore, _params: &MigrationParams) -> MigrationResult<()> {
        store.delete_legacy_preference_key(LEGACY_PUSH_NAMESPACE, LEGACY_PUSH_MODE_KEY)?;
        Ok(())
    }
}
