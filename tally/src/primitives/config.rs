/// Start-up configuration supplied by the host when the client is created.
///
/// # Examples
///
/// ## Swift
///
/// ```swift
/// let config = ClientConfig(
///     deviceId: nil,
///     temporaryDeviceIdEnabled: true,
///     remoteConfigAutomaticRefresh: true
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct ClientConfig {
    /// Developer-supplied device identifier for this start-up, if any.
    pub device_id: Option<String>,
    /// Start in temporary identifier mode when no developer identifier is supplied.
    pub temporary_device_id_enabled: bool,
    /// Re-download remote config after identity changes, consent permitting.
    pub remote_config_automatic_refresh: bool,
}

impl ClientConfig {
    /// Config with a developer-supplied identifier.
    #[must_use]
    pub fn with_device_id(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..Self::default()
        }
    }

    /// Config that starts in temporary identifier mode.
    #[must_use]
    pub fn with_temporary_device_id() -> Self {
        Self {
            temporary_device_id_enabled: true,
            ..Self::default()
        }
    }

    /// Whether the developer supplied an identifier for this start-up.
    #[must_use]
    pub const fn custom_id_provided(&self) -> bool {
        self.device_id.is_some()
    }

    /// Parameters handed to the migration steps for this start-up.
    #[must_use]
    pub const fn migration_params(&self) -> MigrationParams {
        MigrationParams {
            custom_id_set: self.custom_id_provided(),
        }
    }
}

/// Per-run inputs of the migration steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Record)]
pub struct MigrationParams {
    /// A developer-supplied identifier was provided at this start-up.
    pub custom_id_set: bool,
}
