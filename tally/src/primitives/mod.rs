/// Logging bridge to the host, with scoped context prefixes.
pub mod logger;

/// Start-up configuration of the client.
pub mod config;
