use crate::migration::MigrationResult;
use crate::primitives::config::MigrationParams;
use crate::storage::StateStore;

/// One upgrade of persisted state from `from_version()` to `from_version() + 1`.
///
/// Steps must be no-ops when their preconditions are already satisfied, since they can be
/// invoked directly against data that is already current. Malformed data is logged and
/// treated as absent; only store failures are returned.
pub trait MigrationStep: Send + Sync {
    /// Schema version this step upgrades from
    fn from_version(&self) -> i32;

    /// Short name used in log events (e.g. `"device_id_type"`)
    fn name(&self) -> &'static str;

    /// Applies the upgrade
    ///
    /// # Errors
    /// Propagates store failures; the version marker is then left untouched.
    fn apply(&self, store: &StateStore, params: &MigrationParams) -> MigrationResult<()>;
}
