use crate::device_id::{generate_device_id, DeviceIdType, StoredDeviceIdType, TEMPORARY_DEVICE_ID};
use crate::primitives::config::ClientConfig;
use crate::request_queue::QueueRewriter;
use crate::storage::{KeyValueStoreError, StateStore};

/// What the start-up configuration asks for, before anything is read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPlan {
    /// Identifier to use when the store has none: the developer id, the temporary
    /// placeholder, or nothing (generate one).
    pub provided_id: Option<String>,
    /// Type recorded for a stored identifier that has no type yet.
    pub requested_type: DeviceIdType,
    /// The developer supplied an identifier at this start-up.
    pub custom_id_provided: bool,
}

impl StartupPlan {
    /// Applies the start-up identifier policy to `config`.
    ///
    /// A developer-supplied id always wins. Temporary mode only applies without one, and
    /// records the developer-supplied type; acquisition turns the placeholder into
    /// [`DeviceIdType::TemporaryId`].
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        match (&config.device_id, config.temporary_device_id_enabled) {
            (Some(device_id), _) => Self {
                provided_id: Some(device_id.clone()),
                requested_type: DeviceIdType::DeveloperSupplied,
                custom_id_provided: true,
            },
            (None, true) => Self {
                provided_id: Some(TEMPORARY_DEVICE_ID.to_string()),
                requested_type: DeviceIdType::DeveloperSupplied,
                custom_id_provided: false,
            },
            (None, false) => Self {
                provided_id: None,
                requested_type: DeviceIdType::OpenUdid,
                custom_id_provided: false,
            },
        }
    }
}

/// The stored device identifier and its type.
///
/// Holds the only handle to the store that identity operations use, so whoever owns the
/// `DeviceIdentity` (behind a lock) owns the identifier, its type and the request queue
/// as one unit.
pub struct DeviceIdentity {
    store: StateStore,
}

impl DeviceIdentity {
    /// Wraps the state store.
    #[must_use]
    pub const fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Active identifier.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn current_id(&self) -> Result<Option<String>, KeyValueStoreError> {
        self.store.device_id()
    }

    /// Active identifier type; retired and unknown labels are resolved.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn id_type(&self) -> Result<Option<DeviceIdType>, KeyValueStoreError> {
        Ok(self
            .store
            .device_id_type()?
            .map(|label| StoredDeviceIdType::parse(&label).resolve()))
    }

    /// Stores `device_id` with `id_type`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn set_id(&self, device_id: &str, id_type: DeviceIdType) -> Result<(), KeyValueStoreError> {
        self.store.set_device_id(Some(device_id))?;
        self.store.set_device_id_type(Some(id_type.as_str()))
    }

    /// Stores a developer-supplied identifier.
    ///
    /// Callers decide whether re-setting the already active id is worth doing.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn change_to_custom_id(&self, device_id: &str) -> Result<(), KeyValueStoreError> {
        self.set_id(device_id, DeviceIdType::DeveloperSupplied)
    }

    /// Switches to the temporary placeholder.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn enter_temporary_mode(&self) -> Result<(), KeyValueStoreError> {
        self.set_id(TEMPORARY_DEVICE_ID, DeviceIdType::TemporaryId)
    }

    /// Temporary mode needs both the placeholder value and the temporary type; either one
    /// alone is treated as inconsistent legacy data.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn is_temporary(&self) -> Result<bool, KeyValueStoreError> {
        let placeholder_active = self.current_id()?.as_deref() == Some(TEMPORARY_DEVICE_ID);
        Ok(placeholder_active && self.id_type()? == Some(DeviceIdType::TemporaryId))
    }

    /// Queue rewriting over the same store.
    #[must_use]
    pub const fn queue(&self) -> QueueRewriter<'_> {
        QueueRewriter::new(&self.store)
    }

    /// Establishes the active identifier at start-up, after migrations ran.
    ///
    /// A persisted identifier is never replaced here. Without one, the plan's identifier
    /// is used, and without that a new one is generated.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn acquire(&self, plan: &StartupPlan) -> Result<(), KeyValueStoreError> {
        let stored_id = self.current_id()?.filter(|id| !id.is_empty());
        let stored_type = self.store.device_id_type()?;

        match (stored_id, stored_type) {
            (Some(device_id), Some(label)) => {
                crate::debug!("device_id.acquire kept id={device_id} type={label}");
                Ok(())
            }
            (Some(device_id), None) => {
                crate::info!(
                    "device_id.acquire typing_stored_id id={device_id} type={}",
                    plan.requested_type
                );
                self.store
                    .set_device_id_type(Some(plan.requested_type.as_str()))
            }
            (None, _) => match plan.provided_id.as_deref() {
                Some(TEMPORARY_DEVICE_ID) => {
                    crate::info!("device_id.acquire entering temporary mode");
                    self.enter_temporary_mode()
                }
                Some(device_id) => {
                    crate::info!("device_id.acquire using developer id");
                    self.change_to_custom_id(device_id)
                }
                None => {
                    let device_id = generate_device_id();
                    crate::info!("device_id.acquire generated id={device_id}");
                    self.set_id(&device_id, DeviceIdType::OpenUdid)
                }
            },
        }
    }
}
