//! Subscription Registry
//!
//! Tracks the desired subscription state: which instrument tokens the
//! consumer wants and at which streaming mode. The registry is the single
//! source of truth the session replays against the server after every
//! (re)connect, so mutations made while a reconnect is in flight are never
//! lost; they are simply part of the next replay.
//!
//! # Design
//!
//! One mode per token. Subscribing without a mode uses the feed's default
//! (`Mode::Quote`); setting a mode for an unknown token implicitly
//! subscribes it; unsubscribing removes the token entirely. All operations
//! are synchronous and safe under concurrent reads (session) and writes
//! (caller).

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::tick::{InstrumentToken, Mode};

/// Thread-safe desired-state map from instrument token to streaming mode.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<HashMap<InstrumentToken, Mode>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tokens at the default mode.
    ///
    /// Tokens already present keep their current mode.
    pub fn subscribe(&self, tokens: &[InstrumentToken]) {
        let mut entries = self.entries.write();
        for &token in tokens {
            entries.entry(token).or_default();
        }
    }

    /// Remove tokens. Unknown tokens are ignored.
    pub fn unsubscribe(&self, tokens: &[InstrumentToken]) {
        let mut entries = self.entries.write();
        for token in tokens {
            entries.remove(token);
        }
    }

    /// Set or overwrite the mode for tokens, implicitly subscribing any that
    /// are not yet present.
    pub fn set_mode(&self, mode: Mode, tokens: &[InstrumentToken]) {
        let mut entries = self.entries.write();
        for &token in tokens {
            entries.insert(token, mode);
        }
    }

    /// Current token-to-mode mapping, cloned for replay.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<InstrumentToken, Mode> {
        self.entries.read().clone()
    }

    /// Number of subscribed tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no tokens are subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Mode of a single token, if subscribed.
    #[must_use]
    pub fn mode_of(&self, token: InstrumentToken) -> Option<Mode> {
        self.entries.read().get(&token).copied()
    }
}
