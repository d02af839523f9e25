#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::default_trait_access
    )
)]

//! tickfeed - Market Data Feed Client
//!
//! A persistent WebSocket client for a binary market-data feed. It decodes
//! tick packets into typed records, delivers them to consumer callbacks,
//! and keeps the session healthy on its own: staleness detection,
//! reconnection with capped exponential backoff, and resubscription after
//! every reconnect.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure data and state
//!   - `tick`: Modes, the segment table, decoded tick records
//!   - `subscription`: Desired token→mode state, replayed on reconnect
//!
//! - **Application**: Contracts with the embedding code
//!   - `ports`: The `FeedHandler` callback surface
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: Frame codec, wire messages, backoff, liveness, session
//!   - `config`: Environment-driven configuration
//!   - `telemetry`: Tracing initialization
//!
//! # Data Flow
//!
//! ```text
//! Feed WS ──► Session ──► TickCodec ──► event channel ──► FeedHandler
//!                │                                           callbacks
//!                └── replay registry on every (re)connect
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure tick and subscription types with no I/O.
pub mod domain;

/// Application layer - Consumer-facing contracts.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::subscription::SubscriptionRegistry;
pub use domain::tick::{
    DEPTH_LEVELS, DepthLevel, InstrumentToken, MarketDepth, Mode, Ohlc, Segment, TickRecord,
};

// Callback surface
pub use application::ports::FeedHandler;

// Configuration
pub use infrastructure::config::{
    ConfigError, DEFAULT_FEED_URL, FeedConfig, FeedCredentials, WebSocketSettings,
};

// Feed session
pub use infrastructure::feed::{
    ConnectionState, ControlMessage, DecodeError, FeedClient, FeedError, ReconnectConfig,
    ReconnectPolicy, TickCodec, TickerRequest,
};
