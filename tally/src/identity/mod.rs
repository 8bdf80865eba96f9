//! Identity changes requested by the host after start-up.
//!
//! The stored identifier, its type and the request queue change together, so every
//! operation here runs under one change lock. Host collaborators are called with the store
//! lock released: a collaborator may read the identifier, but must not start another
//! identity change from inside the callback.

mod controller;
mod error;

pub use controller::{DeviceIdController, IdChangeOutcome};
pub use error::DeviceIdError;
