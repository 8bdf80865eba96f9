//! Versioned migration of persisted client state.
//!
//! Persisted state carries a schema version marker. At start-up the
//! [`SchemaVersionResolver`] works out which schema the data is in and the
//! [`MigrationController`] runs every registered [`MigrationStep`] from there up to
//! [`DATA_SCHEMA_VERSION`], bumping the marker after each completed step. A run that is
//! interrupted resumes from the last completed step on the next start-up.
//!
//! # Platform Usage
//!
//! ```swift
//! let controller = MigrationController(kvStore: kvStore)
//! let summary = try controller.runAll(params: MigrationParams(customIdSet: false))
//! ```
//!
//! ```kotlin
//! val controller = MigrationController(kvStore)
//! val summary = controller.runAll(MigrationParams(customIdSet = false))
//! ```
//!
//! Hosts normally don't do this themselves: [`crate::client::TallyClient::start`] runs the
//! migrations before anything else reads persisted state.
//!
//! # Adding a step
//!
//! 1. Implement [`MigrationStep`] in `steps/` with `from_version()` equal to the current
//!    [`DATA_SCHEMA_VERSION`]
//! 2. Append it to [`steps::default_steps`]
//! 3. Bump [`DATA_SCHEMA_VERSION`]

mod controller;
mod error;
mod resolver;
mod step;

/// The registered upgrade steps
pub mod steps;

pub use controller::{MigrationController, MigrationRunSummary};
pub use error::{MigrationError, MigrationResult};
pub use resolver::SchemaVersionResolver;
pub use step::MigrationStep;

/// Schema version written by this release.
pub const DATA_SCHEMA_VERSION: i32 = 4;
