use std::sync::Arc;

use chrono::Utc;

use crate::collaborators::{
    Collaborators, ConsentProvider, RemoteConfigProvider, RequestQueueProvider, SessionProvider,
};
use crate::device_id::StartupPlan;
use crate::identity::{DeviceIdController, DeviceIdError};
use crate::migration::{steps::default_steps, MigrationController, MigrationRunSummary};
use crate::primitives::config::ClientConfig;
use crate::storage::{DeviceKeyValueStore, StateStore};

/// Entry point of the engine, created once per process.
///
/// Start-up runs in a fixed order:
/// 1. the identifier policy is computed from the configuration
/// 2. persisted state is migrated to the current schema
/// 3. the device identifier is acquired
/// 4. temporary mode is exited, or leftover placeholder-tagged requests are retagged
///
/// # Examples
///
/// ```kotlin
/// setLogger(TallyLogBridge)
/// val client = TallyClient.start(
///     kvStore,
///     ClientConfig(deviceId = null, temporaryDeviceIdEnabled = false, remoteConfigAutomaticRefresh = true),
///     consent, remoteConfig, requestQueue, sessions,
/// )
/// val deviceId = client.deviceIdController().deviceId()
/// ```
#[derive(uniffi::Object)]
pub struct TallyClient {
    migrations: Arc<MigrationController>,
    device_ids: Arc<DeviceIdController>,
    last_migration_summary: Option<MigrationRunSummary>,
}

#[crate::tally_export]
impl TallyClient {
    /// Migrate persisted state and establish the device identifier.
    ///
    /// A failed migration run is logged and start-up continues on whatever schema the
    /// data reached; the next start-up resumes it.
    ///
    /// # Errors
    /// `DeviceIdError::KeyValueStore` if the host store fails while the identifier is
    /// acquired.
    #[uniffi::constructor]
    pub fn start(
        kv_store: Arc<dyn DeviceKeyValueStore>,
        config: ClientConfig,
        consent: Arc<dyn ConsentProvider>,
        remote_config: Arc<dyn RemoteConfigProvider>,
        request_queue: Arc<dyn RequestQueueProvider>,
        sessions: Arc<dyn SessionProvider>,
    ) -> Result<Arc<Self>, DeviceIdError> {
        let collaborators = Collaborators {
            consent,
            remote_config,
            request_queue,
            sessions,
        };
        Self::start_with(StateStore::new(kv_store), &config, collaborators)
    }

    /// The identity-change surface.
    pub fn device_id_controller(&self) -> Arc<DeviceIdController> {
        self.device_ids.clone()
    }

    /// The migration controller over the same store.
    pub fn migration_controller(&self) -> Arc<MigrationController> {
        self.migrations.clone()
    }

    /// Summary of the migration run at start-up, `None` if it failed.
    pub fn last_migration_summary(&self) -> Option<MigrationRunSummary> {
        self.last_migration_summary
    }
}

impl TallyClient {
    /// Start-up over an already wrapped store.
    ///
    /// # Errors
    /// Propagates store failures while the identifier is acquired.
    pub fn start_with(
        store: StateStore,
        config: &ClientConfig,
        collaborators: Collaborators,
    ) -> Result<Arc<Self>, DeviceIdError> {
        crate::info!(
            "client.starting custom_id={} temporary_device_id={} timestamp={}",
            config.custom_id_provided(),
            config.temporary_device_id_enabled,
            Utc::now().to_rfc3339()
        );
        let plan = StartupPlan::from_config(config);

        let migrations = MigrationController::with_steps(store.clone(), default_steps());
        let last_migration_summary = match migrations.run_all(config.migration_params()) {
            Ok(summary) => Some(summary),
            Err(e) => {
                crate::error!("client.migration_failed error={e}");
                None
            }
        };

        let device_ids = DeviceIdController::new(
            store,
            collaborators,
            config.remote_config_automatic_refresh,
        );
        let temporary = device_ids.finish_startup(&plan)?;

        crate::info!(
            "client.started temporary={temporary} timestamp={}",
            Utc::now().to_rfc3339()
        );

        Ok(Arc::new(Self {
            migrations,
            device_ids,
            last_migration_summary,
        }))
    }
}
