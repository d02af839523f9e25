//! Port Interfaces
//!
//! The contract between the feed session engine and the consumer embedding
//! it. The engine drives the consumer through [`FeedHandler`]: a capability
//! set of callbacks, each defaulted to a no-op, so consumers implement only
//! the notifications they care about. There is no listener hierarchy to
//! inherit from; a unit struct with one overridden method is a valid
//! handler.
//!
//! Callbacks are invoked from a dedicated dispatcher task, decoupled from
//! the socket receive loop by a bounded channel, so a slow callback does not
//! stall frame receipt. Handlers must therefore be `Send + Sync`; anything
//! long-running should be handed off to the consumer's own tasks.

use crate::domain::tick::TickRecord;
use crate::infrastructure::feed::messages::ControlMessage;
use crate::infrastructure::feed::session::FeedError;

/// Consumer callbacks invoked by the feed session.
///
/// Every method has an empty default implementation.
#[allow(unused_variables)]
pub trait FeedHandler: Send + Sync {
    /// The session reached the connected state. `status` is the HTTP status
    /// of the WebSocket handshake response.
    fn on_connect(&self, status: u16) {}

    /// One decoded tick batch, in the order the frame carried them.
    fn on_ticks(&self, ticks: Vec<TickRecord>) {}

    /// A non-error text control message (order updates, broker notices).
    fn on_message(&self, message: ControlMessage) {}

    /// The connection was closed by the peer.
    fn on_close(&self, code: u16, reason: &str) {}

    /// A classified, non-terminal failure: transport errors trigger a
    /// reconnect, decode errors drop one frame, server error messages are
    /// informational.
    fn on_error(&self, error: &FeedError) {}

    /// A reconnect attempt is about to be made after the backoff delay.
    fn on_reconnect(&self, attempt: u32) {}

    /// The reconnect budget is exhausted; the session is closed for good.
    fn on_noreconnect(&self) {}
}
