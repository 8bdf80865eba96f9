use crate::migration::{MigrationResult, MigrationStep};
use crate::primitives::config::MigrationParams;
use crate::request_queue::QueueRewriter;
use crate::storage::StateStore;

/// 3 → 4: tags queued requests created before requests carried a `device_id`.
///
/// Every entry without the parameter gets the identifier stored now, the temporary
/// placeholder included. That is the best available guess for the identifier that was
/// active when the entry was queued; it is wrong for entries queued before an identity
/// change that happened before this upgrade. Entries that already carry the parameter are
/// not touched.
pub struct RequestQueueDeviceIdStep;

impl MigrationStep for RequestQueueDeviceIdStep {
    fn from_version(&self) -> i32 {
        3
    }

    fn name(&self) -> &'static str {
        "request_queue_device_id"
    }

    fn apply(&self, store: &StateStore, _params: &MigrationParams) -> MigrationResult<()> {
        let Some(device_id) = store.device_id()?.filter(|id| !id.is_empty()) else {
            crate::info!("migration.request_queue_device_id skipped reason=no_device_id");
            return Ok(());
        };

        let tagged = QueueRewriter::new(store).backfill_device_id(&device_id)?;
        crate::info!("migration.request_queue_device_id tagged={tagged}");
        Ok(())
    }
}
