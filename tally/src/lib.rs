#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `tally` is the persisted-state core of the tally analytics client.
//!
//! It upgrades on-device data from any earlier schema to the current one and keeps the
//! queue of pending requests consistent with the active device identifier, including the
//! temporary-identifier protocol used before a real identifier is known.
//!
//! The host (Swift/Kotlin) provides the durable key-value store and the collaborators
//! (consent, remote config, request queue, sessions) through `UniFFI` foreign traits.

/// Start-up orchestration tying migrations and device identifier acquisition together.
pub mod client;

/// Traits implemented by the host for the side effects of identity changes.
pub mod collaborators;

/// Device identifier types, generation and the stored identifier lifecycle.
pub mod device_id;

/// The locked identity-change surface exposed to the host.
pub mod identity;

/// Versioned migration of persisted client state.
pub mod migration;

/// Logging and configuration primitives.
pub mod primitives;

/// Remote-config value records and the legacy format migrator.
pub mod remote_config;

/// Literal rewriting of the `device_id` tag inside serialized queued requests.
pub mod request_queue;

/// Host key-value store and the typed persisted-state facade on top of it.
pub mod storage;

/// Error handling helpers shared by the error enums of this crate.
pub mod tally_error;

pub use tally_error::tally_error;
pub use tally_macros::tally_export;

uniffi::setup_scaffolding!("tally");
