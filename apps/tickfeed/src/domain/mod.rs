//! Domain layer.
//!
//! Pure data types and state with no I/O: decoded ticks, the market-segment
//! table, and the subscription registry.

/// Tick records, modes, and the segment lookup table.
pub mod tick;

/// Desired-state subscription tracking.
pub mod subscription;
