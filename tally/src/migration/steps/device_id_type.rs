use crate::device_id::{generate_device_id, DeviceIdType, StoredDeviceIdType};
use crate::migration::{MigrationResult, MigrationStep};
use crate::primitives::config::MigrationParams;
use crate::storage::StateStore;

/// 0 → 1: maps stored identifier type labels onto the current enumeration.
///
/// - the retired advertising-id label becomes `OPEN_UDID`
/// - unknown labels become `DEVELOPER_SUPPLIED`
/// - an identifier without a type gets `DEVELOPER_SUPPLIED` when a developer id was
///   supplied at this start-up, `OPEN_UDID` otherwise
///
/// An `OPEN_UDID` type without an identifier value gets a freshly generated one. Existing
/// identifier values are never replaced.
pub struct DeviceIdTypeStep;

impl MigrationStep for DeviceIdTypeStep {
    fn from_version(&self) -> i32 {
        0
    }

    fn name(&self) -> &'static str {
        "device_id_type"
    }

    fn apply(&self, store: &StateStore, params: &MigrationParams) -> MigrationResult<()> {
        let stored_id = store.device_id()?.filter(|id| !id.is_empty());

        let Some(label) = store.device_id_type()? else {
            if let Some(device_id) = stored_id {
                let id_type = if params.custom_id_set {
                    DeviceIdType::DeveloperSupplied
                } else {
                    DeviceIdType::OpenUdid
                };
                crate::info!(
                    "migration.device_id_type typing_stored_id id={device_id} type={id_type}"
                );
                store.set_device_id_type(Some(id_type.as_str()))?;
            }
            return Ok(());
        };

        let id_type = match StoredDeviceIdType::parse(&label) {
            StoredDeviceIdType::Current(id_type) => id_type,
            legacy @ StoredDeviceIdType::AdvertisingId => {
                let id_type = legacy.resolve();
                crate::info!("migration.device_id_type relabeled from={label} to={id_type}");
                store.set_device_id_type(Some(id_type.as_str()))?;
                id_type
            }
            unknown @ StoredDeviceIdType::Unrecognized => {
                let id_type = unknown.resolve();
                crate::warn!(
                    "migration.device_id_type unrecognized_label label={label:?} to={id_type}"
                );
                store.set_device_id_type(Some(id_type.as_str()))?;
                id_type
            }
        };

        if id_type == DeviceIdType::OpenUdid && stored_id.is_none() {
            let device_id = generate_device_id();
            crate::info!("migration.device_id_type generated id={device_id}");
            store.set_device_id(Some(&device_id))?;
        }

        Ok(())
    }
}
