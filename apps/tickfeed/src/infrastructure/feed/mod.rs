//! Feed Adapter
//!
//! Everything that speaks the feed's wire protocol: the frame codec, the
//! control-message types, the backoff and liveness policies, and the
//! session state machine that ties them to a live WebSocket.

pub mod codec;
pub mod liveness;
pub mod messages;
pub mod reconnect;
pub mod session;

pub use codec::{DecodeError, TickCodec};
pub use liveness::{LivenessConfig, LivenessEvent, LivenessMonitor, LivenessState};
pub use messages::{ControlMessage, RequestAction, RequestValue, TickerRequest};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use session::{ConnectionState, FeedClient, FeedError};
