use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use chrono::Utc;

use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::resolver::SchemaVersionResolver;
use crate::migration::step::MigrationStep;
use crate::migration::steps::default_steps;
use crate::migration::DATA_SCHEMA_VERSION;
use crate::primitives::config::MigrationParams;
use crate::storage::{DeviceKeyValueStore, StateStore};

/// Summary of a migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Record)]
pub struct MigrationRunSummary {
    /// Schema version the persisted state was in before the run
    pub from_version: i32,
    /// Schema version the persisted state is in after the run
    pub to_version: i32,
    /// Number of steps applied
    pub steps_run: i32,
}

/// Runs the registered steps against the persisted state.
///
/// ## Version marker
///
/// The marker is written after each step's own writes succeeded, never before. A run that
/// stops halfway (crash, store failure) leaves the marker at the last completed step, and
/// the next run resumes from there.
///
/// Markers below zero or at/above [`DATA_SCHEMA_VERSION`] run nothing and are left as
/// they are.
#[derive(uniffi::Object)]
pub struct MigrationController {
    store: StateStore,
    steps: Vec<Arc<dyn MigrationStep>>,
    run_guard: Mutex<()>,
}

#[crate::tally_export]
impl MigrationController {
    /// Create a new [`MigrationController`] with the default steps.
    #[uniffi::constructor]
    pub fn new(kv_store: Arc<dyn DeviceKeyValueStore>) -> Arc<Self> {
        Self::with_steps(StateStore::new(kv_store), default_steps())
    }

    /// Upgrade persisted state to [`DATA_SCHEMA_VERSION`].
    ///
    /// # Concurrency
    ///
    /// Fails fast: if another run on this controller is in progress, returns
    /// `InvalidOperation` instead of waiting.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if a run is already in progress
    /// - `MigrationError::KeyValueStore` if the host store fails; the marker then stays
    ///   at the last completed step
    pub fn run_all(
        &self,
        params: MigrationParams,
    ) -> Result<MigrationRunSummary, MigrationError> {
        let _guard = self.acquire_run_guard()?;
        self.run_all_locked(&params)
    }

    /// Apply the single step upgrading from `from_version`, without touching the marker.
    ///
    /// Steps are no-ops on data that is already upgraded, so this is safe on current data.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if no step upgrades from `from_version` or a
    ///   run is in progress
    /// - `MigrationError::KeyValueStore` if the host store fails
    pub fn run_step(
        &self,
        from_version: i32,
        params: MigrationParams,
    ) -> Result<(), MigrationError> {
        let _guard = self.acquire_run_guard()?;
        let step = self.step_from(from_version).ok_or_else(|| {
            MigrationError::InvalidOperation(format!(
                "no migration step from version {from_version}"
            ))
        })?;
        crate::info!("migration.step_invoked name={} from={from_version}", step.name());
        step.apply(&self.store, &params)
    }

    /// Resolved schema version of the persisted state.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if a run is in progress
    /// - `MigrationError::KeyValueStore` if the host store fails
    pub fn current_schema_version(&self) -> Result<i32, MigrationError> {
        let _guard = self.acquire_run_guard()?;
        Ok(SchemaVersionResolver::new(&self.store).resolve()?)
    }

    /// Force the schema version marker.
    ///
    /// **Developer/testing use only.** Out-of-range values are stored as given.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if a run is in progress
    /// - `MigrationError::KeyValueStore` if the host store fails
    pub fn override_schema_version(&self, version: i32) -> Result<(), MigrationError> {
        let _guard = self.acquire_run_guard()?;
        crate::warn!(
            "migration.version_overridden version={version} timestamp={}",
            Utc::now().to_rfc3339()
        );
        Ok(self.store.set_schema_version(version)?)
    }
}

impl MigrationController {
    /// Create a controller over `store` with the steps injected in
    #[must_use]
    pub fn with_steps(store: StateStore, steps: Vec<Arc<dyn MigrationStep>>) -> Arc<Self> {
        Arc::new(Self {
            store,
            steps,
            run_guard: Mutex::new(()),
        })
    }

    fn acquire_run_guard(&self) -> MigrationResult<MutexGuard<'_, ()>> {
        match self.run_guard.try_lock() {
            Ok(guard) => Ok(guard),
            // the guard protects no data, a panicked run leaves nothing to repair
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(MigrationError::InvalidOperation(
                "Migration is already in progress. Please wait for the current migration to complete."
                    .to_string(),
            )),
        }
    }

    fn step_from(&self, version: i32) -> Option<&Arc<dyn MigrationStep>> {
        self.steps.iter().find(|step| step.from_version() == version)
    }

    fn run_all_locked(
        &self,
        params: &MigrationParams,
    ) -> MigrationResult<MigrationRunSummary> {
        let run_start_time = Utc::now();
        let from_version = SchemaVersionResolver::new(&self.store).resolve()?;

        crate::info!(
            "migration_run.started from_version={} latest={} custom_id_set={} timestamp={}",
            from_version,
            DATA_SCHEMA_VERSION,
            params.custom_id_set,
            run_start_time.to_rfc3339()
        );

        let mut summary = MigrationRunSummary {
            from_version,
            to_version: from_version,
            steps_run: 0,
        };

        if from_version < 0 {
            crate::error!(
                "migration_run.invalid_version version={} timestamp={}",
                from_version,
                Utc::now().to_rfc3339()
            );
            return Ok(summary);
        }

        while summary.to_version < DATA_SCHEMA_VERSION {
            let version = summary.to_version;
            let Some(step) = self.step_from(version) else {
                crate::error!(
                    "migration.step_missing from={} timestamp={}",
                    version,
                    Utc::now().to_rfc3339()
                );
                break;
            };

            let step_start = Utc::now();
            if let Err(e) = step.apply(&self.store, params) {
                crate::error!(
                    "migration.step_failed name={} from={} error={:?} timestamp={}",
                    step.name(),
                    version,
                    e,
                    Utc::now().to_rfc3339()
                );
                return Err(e);
            }
            self.store.set_schema_version(version + 1)?;

            summary.to_version = version + 1;
            summary.steps_run += 1;
            crate::info!(
                "migration.step_completed name={} from={} to={} duration_ms={} timestamp={}",
                step.name(),
                version,
                version + 1,
                (Utc::now() - step_start).num_milliseconds(),
                Utc::now().to_rfc3339()
            );
        }

        crate::info!(
            "migration_run.completed from_version={} to_version={} steps_run={} duration_ms={} timestamp={}",
            summary.from_version,
            summary.to_version,
            summary.steps_run,
            (Utc::now() - run_start_time).num_milliseconds(),
            Utc::now().to_rfc3339()
        );

        Ok(summary)
    }
}
