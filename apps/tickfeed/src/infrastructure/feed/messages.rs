//! Feed Wire Message Types
//!
//! Serde types for the feed's text frames in both directions. Binary tick
//! frames never pass through here; they are handled by the codec.
//!
//! # Outbound
//!
//! Control requests are JSON objects with an action and a value:
//!
//! ```json
//! {"a": "subscribe", "v": [5633, 738561]}
//! {"a": "unsubscribe", "v": [5633]}
//! {"a": "mode", "v": ["full", [5633, 738561]]}
//! ```
//!
//! # Inbound
//!
//! Text frames carry control messages: order updates, broker notices, and
//! error notifications:
//!
//! ```json
//! {"type": "order", "data": {...}}
//! {"type": "error", "data": "Invalid access token"}
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::tick::{InstrumentToken, Mode};

// =============================================================================
// Outbound Requests
// =============================================================================

/// Action discriminator of an outbound control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    /// Subscribe tokens at the server's default mode.
    Subscribe,
    /// Drop tokens from the stream.
    Unsubscribe,
    /// Change the streaming mode of tokens.
    Mode,
}

/// Value payload of an outbound control request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestValue {
    /// Token list, for subscribe/unsubscribe.
    Tokens(Vec<InstrumentToken>),
    /// Mode name plus token list, for mode changes.
    ModeTokens(Mode, Vec<InstrumentToken>),
}

/// One outbound control frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerRequest {
    /// Requested action.
    #[serde(rename = "a")]
    pub action: RequestAction,
    /// Action payload.
    #[serde(rename = "v")]
    pub value: RequestValue,
}

impl TickerRequest {
    /// Build a subscribe request.
    #[must_use]
    pub const fn subscribe(tokens: Vec<InstrumentToken>) -> Self {
        Self {
            action: RequestAction::Subscribe,
            value: RequestValue::Tokens(tokens),
        }
    }

    /// Build an unsubscribe request.
    #[must_use]
    pub const fn unsubscribe(tokens: Vec<InstrumentToken>) -> Self {
        Self {
            action: RequestAction::Unsubscribe,
            value: RequestValue::Tokens(tokens),
        }
    }

    /// Build a mode-change request.
    #[must_use]
    pub const fn mode(mode: Mode, tokens: Vec<InstrumentToken>) -> Self {
        Self {
            action: RequestAction::Mode,
            value: RequestValue::ModeTokens(mode, tokens),
        }
    }
}

/// Control frames that re-establish a desired subscription state.
///
/// Tokens are grouped by mode, each group sorted, and emitted as a
/// subscribe request followed by a mode request, the fewest frames that
/// reproduce the snapshot exactly, with deterministic ordering for tests
/// and logs.
#[must_use]
pub fn replay_requests(snapshot: &HashMap<InstrumentToken, Mode>) -> Vec<TickerRequest> {
    let mut by_mode: std::collections::BTreeMap<Mode, Vec<InstrumentToken>> =
        std::collections::BTreeMap::new();
    for (&token, &mode) in snapshot {
        by_mode.entry(mode).or_default().push(token);
    }

    let mut requests = Vec::with_capacity(by_mode.len() * 2);
    for (mode, mut tokens) in by_mode {
        tokens.sort_unstable();
        requests.push(TickerRequest::subscribe(tokens.clone()));
        requests.push(TickerRequest::mode(mode, tokens));
    }
    requests
}

// =============================================================================
// Inbound Control Messages
// =============================================================================

/// Message kind carried by error notifications.
pub const KIND_ERROR: &str = "error";

/// Message kind carried by order postbacks.
pub const KIND_ORDER: &str = "order";

/// One inbound text control frame.
///
/// The payload shape depends on the kind, so it is kept as raw JSON; typed
/// accessors cover the cases the session itself must understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Message kind: `order`, `message`, or `error`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ControlMessage {
    /// Whether this is an error notification.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == KIND_ERROR
    }

    /// Whether this is an order postback.
    #[must_use]
    pub fn is_order(&self) -> bool {
        self.kind == KIND_ORDER
    }

    /// Error text of an error notification, when present.
    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        if self.is_error() { self.data.as_str() } else { None }
    }

    /// Whether this error notification reports rejected credentials.
    ///
    /// Retrying with the same credentials cannot succeed, so the session
    /// treats these as terminal.
    #[must_use]
    pub fn is_credential_rejection(&self) -> bool {
        self.error_text()
            .is_some_and(|text| text.contains("TokenException") || text.contains("access token"))
    }
}
