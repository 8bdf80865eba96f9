use crate::storage::KeyValueStoreError;

/// Errors returned by identity changes.
///
/// Rejected input (`EmptyDeviceId`, `NotInitialized`) leaves the stored identity untouched.
#[crate::tally_error]
pub enum DeviceIdError {
    /// An empty string was passed as the new identifier
    #[error("device id can't be empty")]
    EmptyDeviceId,

    /// The operation needs an active identifier and none is stored
    #[error("no device id has been acquired")]
    NotInitialized,

    /// The host store failed
    #[error(transparent)]
    KeyValueStore(#[from] KeyValueStoreError),
}
