//! Configuration Module
//!
//! Configuration loading for the feed client.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_FEED_URL, FeedConfig, FeedCredentials, WebSocketSettings,
};
