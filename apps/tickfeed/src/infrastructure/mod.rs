//! Infrastructure layer.
//!
//! Adapters binding the domain to the outside world: the feed protocol,
//! configuration loading, and telemetry.

/// Feed protocol adapter: codec, wire messages, session state machine.
pub mod feed;

/// Environment-driven configuration.
pub mod config;

/// Tracing initialization.
pub mod telemetry;
