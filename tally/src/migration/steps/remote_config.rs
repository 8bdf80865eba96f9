use crate::migration::{MigrationResult, MigrationStep};
use crate::primitives::config::MigrationParams;
use crate::remote_config::RemoteConfigValueStore;
use crate::storage::StateStore;

/// 1 → 2: rewrites the flat legacy remote-config blob into value records owned by the
/// current user.
///
/// A blob already in the current layout is left alone. Anything unreadable becomes an
/// empty store.
pub struct RemoteConfigStep;

impl MigrationStep for RemoteConfigStep {
    fn from_version(&self) -> i32 {
        1
    }

    fn name(&self) -> &'static str {
        "remote_config"
    }

    fn apply(&self, store: &StateStore, _params: &MigrationParams) -> MigrationResult<()> {
        let blob = store.remote_config_blob()?;

        if let Some(current) = blob
            .as_deref()
            .and_then(RemoteConfigValueStore::parse_current)
        {
            crate::debug!(
                "migration.remote_config already_current entries={}",
                current.len()
            );
            return Ok(());
        }

        let converted = RemoteConfigValueStore::from_legacy_blob(blob.as_deref());
        crate::info!("migration.remote_config converted entries={}", converted.len());
        store.set_remote_config_blob(&converted.to_json()?)?;
        Ok(())
    }
}
