use crate::migration::DATA_SCHEMA_VERSION;
use crate::storage::{KeyValueStoreError, StateStore};

/// Works out which schema the persisted state is in.
pub struct SchemaVersionResolver<'a> {
    store: &'a StateStore,
}

impl<'a> SchemaVersionResolver<'a> {
    /// Resolves against `store`.
    #[must_use]
    pub const fn new(store: &'a StateStore) -> Self {
        Self { store }
    }

    /// Stored schema version.
    ///
    /// Without a version marker, an install that stored nothing yet is at
    /// [`DATA_SCHEMA_VERSION`] and one that stored something predates version tracking
    /// and is at `0`. Either answer is written back, so later calls only read the marker.
    /// A stored marker is returned unchanged, even when out of range.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn resolve(&self) -> Result<i32, KeyValueStoreError> {
        if let Some(version) = self.store.schema_version()? {
            return Ok(version);
        }

        let version = if self.store.anything_stored()? {
            crate::info!("migration.resolver legacy_install version=0");
            0
        } else {
            crate::info!("migration.resolver fresh_install version={DATA_SCHEMA_VERSION}");
            DATA_SCHEMA_VERSION
        };

        self.store.set_schema_version(version)?;
        Ok(version)
    }
}
