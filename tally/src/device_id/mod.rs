//! Device identifier types and generation.
//!
//! Identifier types are persisted as string labels. Labels are mapped onto the closed
//! [`DeviceIdType`] enum exactly once, through [`StoredDeviceIdType::parse`]; nothing past
//! that boundary handles raw labels.

mod identity;

pub use identity::{DeviceIdentity, StartupPlan};

/// Reserved identifier used while the real identifier is not yet known.
///
/// Generated identifiers are lowercase hyphenated hex, so they can never equal this value.
pub const TEMPORARY_DEVICE_ID: &str = "CLYTemporaryDeviceID";

/// Stored label of the retired advertising-id type.
pub const LEGACY_ADVERTISING_ID_LABEL: &str = "ADVERTISING_ID";

/// How the active device identifier was obtained.
///
/// "No identifier yet" is represented as `Option::None` by the accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum DeviceIdType {
    /// Randomly generated on this device.
    OpenUdid,
    /// Supplied by the app developer.
    DeveloperSupplied,
    /// The [`TEMPORARY_DEVICE_ID`] placeholder is active.
    TemporaryId,
}

impl DeviceIdType {
    /// Label persisted in the store.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenUdid => "OPEN_UDID",
            Self::DeveloperSupplied => "DEVELOPER_SUPPLIED",
            Self::TemporaryId => "TEMPORARY_ID",
        }
    }
}

impl std::fmt::Display for DeviceIdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A type label as it may appear in persisted state, including retired labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredDeviceIdType {
    /// The retired advertising-id label; rewritten by the first migration step.
    AdvertisingId,
    /// A label of the current enumeration.
    Current(DeviceIdType),
    /// A label this version does not know.
    Unrecognized,
}

const STORED_LABELS: [(&str, StoredDeviceIdType); 4] = [
    (
        LEGACY_ADVERTISING_ID_LABEL,
        StoredDeviceIdType::AdvertisingId,
    ),
    (
        "OPEN_UDID",
        StoredDeviceIdType::Current(DeviceIdType::OpenUdid),
    ),
    (
        "DEVELOPER_SUPPLIED",
        StoredDeviceIdType::Current(DeviceIdType::DeveloperSupplied),
    ),
    (
        "TEMPORARY_ID",
        StoredDeviceIdType::Current(DeviceIdType::TemporaryId),
    ),
];

impl StoredDeviceIdType {
    /// Looks `label` up in the label table.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        STORED_LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map_or(Self::Unrecognized, |(_, parsed)| *parsed)
    }

    /// The current type this label stands for.
    ///
    /// The advertising-id label reads as [`DeviceIdType::OpenUdid`]; unknown labels read as
    /// [`DeviceIdType::DeveloperSupplied`].
    #[must_use]
    pub const fn resolve(self) -> DeviceIdType {
        match self {
            Self::AdvertisingId => DeviceIdType::OpenUdid,
            Self::Current(id_type) => id_type,
            Self::Unrecognized => DeviceIdType::DeveloperSupplied,
        }
    }
}

/// Generates a new random device identifier.
///
/// The identifier is the hyphenated form of 128 random bits (36 characters).
#[must_use]
pub fn generate_device_id() -> String {
    let bytes: [u8; 16] = rand::random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}
