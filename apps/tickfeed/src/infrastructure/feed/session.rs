//! Feed Session
//!
//! The connection lifecycle state machine. One driver task owns the
//! WebSocket: it connects, replays the subscription registry, and then
//! multiplexes inbound frames, queued control-frame sends, the liveness
//! watchdog, and cancellation in a single `select!` loop. Connection
//! failures of any kind funnel into one reconnect loop with capped
//! exponential backoff; credential rejections short-circuit it.
//!
//! Decoded batches and lifecycle notifications travel through a bounded
//! event channel to a dispatcher task that invokes the consumer's
//! [`FeedHandler`], so a slow callback never stalls frame receipt.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::application::ports::FeedHandler;
use crate::domain::subscription::SubscriptionRegistry;
use crate::domain::tick::{InstrumentToken, Mode, TickRecord};
use crate::infrastructure::config::FeedConfig;
use crate::infrastructure::feed::codec::{DecodeError, TickCodec};
use crate::infrastructure::feed::liveness::{
    LivenessConfig, LivenessEvent, LivenessMonitor, LivenessState,
};
use crate::infrastructure::feed::messages::{ControlMessage, TickerRequest, replay_requests};
use crate::infrastructure::feed::reconnect::{ReconnectConfig, ReconnectPolicy};

/// Queued control frames awaiting the driver. Overflow is harmless: the
/// registry replay resynchronizes the server on the next connect.
const COMMAND_BUFFER: usize = 64;

/// Events in flight between the driver and the callback dispatcher.
const EVENT_BUFFER: usize = 1024;

/// Close code when the server did not send one.
const CLOSE_CODE_ABSENT: u16 = 1005;

// =============================================================================
// Error Type
// =============================================================================

/// Errors classified by the feed session.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// WebSocket connection could not be established.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket protocol or transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame failed to decode; the frame was dropped.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// No frame arrived within the liveness window.
    #[error("no frames within the liveness window")]
    LivenessTimeout,

    /// The feed rejected the credentials. Terminal: retrying with the same
    /// credentials cannot succeed.
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// A non-fatal error notification from the feed.
    #[error("feed error message: {0}")]
    Server(String),

    /// The connection ended without an error frame.
    #[error("connection closed")]
    ConnectionClosed,

    /// The reconnect budget is exhausted.
    #[error("reconnect attempts exhausted after {attempts} tries")]
    RetryExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The session was closed and cannot be reused.
    #[error("session closed")]
    Closed,
}

impl FeedError {
    /// Whether the error terminates the session without retry.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationRejected(_))
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of the session, owned by the driver task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection attempt has been made.
    #[default]
    Disconnected,
    /// A handshake is in flight.
    Connecting,
    /// Streaming; subscriptions are live.
    Connected,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting,
    /// Terminal: closed by the consumer, a fatal error, or retry
    /// exhaustion.
    Closed,
}

impl ConnectionState {
    /// Whether the session is currently streaming.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether the session has terminated.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// State name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        }
    }
}

// =============================================================================
// Internal Plumbing
// =============================================================================

/// Lifecycle and data events handed to the callback dispatcher.
#[derive(Debug)]
enum FeedEvent {
    Connected { status: u16 },
    Ticks(Vec<TickRecord>),
    Message(ControlMessage),
    Error(FeedError),
    Closed { code: u16, reason: String },
    Reconnecting { attempt: u32 },
    NoReconnect,
}

/// Requests from the public API to the driver task.
enum Command {
    Send(TickerRequest),
}

/// Channel ends handed to the driver and dispatcher on the first connect.
struct SessionChannels {
    command_rx: mpsc::Receiver<Command>,
    event_tx: mpsc::Sender<FeedEvent>,
    event_rx: mpsc::Receiver<FeedEvent>,
    handler: Arc<dyn FeedHandler>,
}

// =============================================================================
// Feed Client
// =============================================================================

/// Handle to one feed session.
///
/// Cheap to clone; all clones drive the same session. Each client instance
/// is self-contained, so multiple sessions with different credentials can
/// coexist in one process.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use tickfeed::{FeedClient, FeedConfig, FeedCredentials, FeedHandler, Mode, TickRecord};
///
/// struct Printer;
///
/// impl FeedHandler for Printer {
///     fn on_ticks(&self, ticks: Vec<TickRecord>) {
///         for tick in ticks {
///             println!("{} {}", tick.token, tick.last_price);
///         }
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = FeedCredentials::new("api_key", "access_token")?;
/// let client = FeedClient::new(FeedConfig::new(credentials), Arc::new(Printer));
/// client.subscribe(&[5633]);
/// client.set_mode(Mode::Full, &[5633]);
/// client.connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FeedClient {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: FeedConfig,
    registry: SubscriptionRegistry,
    codec: TickCodec,
    state: RwLock<ConnectionState>,
    cancel: CancellationToken,
    command_tx: mpsc::Sender<Command>,
    started: AtomicBool,
    channels: Mutex<Option<SessionChannels>>,
}

impl FeedClient {
    /// Create a client for the given configuration and callback handler.
    ///
    /// Nothing happens until [`connect`](Self::connect) is called.
    #[must_use]
    pub fn new(config: FeedConfig, handler: Arc<dyn FeedHandler>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        Self {
            inner: Arc::new(SessionInner {
                config,
                registry: SubscriptionRegistry::new(),
                codec: TickCodec::new(),
                state: RwLock::new(ConnectionState::Disconnected),
                cancel: CancellationToken::new(),
                command_tx,
                started: AtomicBool::new(false),
                channels: Mutex::new(Some(SessionChannels {
                    command_rx,
                    event_tx,
                    event_rx,
                    handler,
                })),
            }),
        }
    }

    /// Start the session's driver and dispatcher tasks.
    ///
    /// Idempotent while the session is connecting or connected. Must be
    /// called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Closed`] after a terminal close.
    pub fn connect(&self) -> Result<(), FeedError> {
        if self.inner.cancel.is_cancelled() || self.state().is_closed() {
            return Err(FeedError::Closed);
        }
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let Some(channels) = self.inner.channels.lock().take() else {
            return Ok(());
        };
        let SessionChannels {
            command_rx,
            event_tx,
            event_rx,
            handler,
        } = channels;

        tokio::spawn(dispatch_events(handler, event_rx));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.run(command_rx, event_tx));

        Ok(())
    }

    /// Close the session for good.
    ///
    /// Terminal from any state, including mid-backoff: a pending reconnect
    /// delay is cancelled immediately. Subsequent `connect` calls fail.
    pub fn close(&self) {
        *self.inner.state.write() = ConnectionState::Closed;
        self.inner.cancel.cancel();
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Subscribe tokens at the default mode.
    ///
    /// Always recorded in the registry; when connected, a subscribe frame
    /// is also sent immediately. Otherwise the registry replay on the next
    /// connect covers it.
    pub fn subscribe(&self, tokens: &[InstrumentToken]) {
        self.inner.registry.subscribe(tokens);
        self.inner
            .send_if_connected(TickerRequest::subscribe(tokens.to_vec()));
    }

    /// Unsubscribe tokens. Unknown tokens are ignored.
    pub fn unsubscribe(&self, tokens: &[InstrumentToken]) {
        self.inner.registry.unsubscribe(tokens);
        self.inner
            .send_if_connected(TickerRequest::unsubscribe(tokens.to_vec()));
    }

    /// Set the streaming mode for tokens, implicitly subscribing unknown
    /// ones.
    pub fn set_mode(&self, mode: Mode, tokens: &[InstrumentToken]) {
        self.inner.registry.set_mode(mode, tokens);
        self.inner
            .send_if_connected(TickerRequest::mode(mode, tokens.to_vec()));
    }

    /// Snapshot of the desired subscription state.
    #[must_use]
    pub fn subscriptions(&self) -> HashMap<InstrumentToken, Mode> {
        self.inner.registry.snapshot()
    }
}

impl SessionInner {
    /// Transition state; a terminal close always wins over in-flight
    /// transitions from the driver.
    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state.write();
        if !state.is_closed() {
            tracing::debug!(from = state.as_str(), to = next.as_str(), "Session state");
            *state = next;
        }
    }

    fn send_if_connected(&self, request: TickerRequest) {
        if self.state.read().is_connected()
            && self.command_tx.try_send(Command::Send(request)).is_err()
        {
            // Queue full or driver gone; the next replay resynchronizes.
            tracing::debug!("Control frame not queued; deferring to replay");
        }
    }

    /// Driver: the reconnect loop around one streaming connection at a time.
    async fn run(
        self: Arc<Self>,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::Sender<FeedEvent>,
    ) {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::from_websocket_settings(
            &self.config.websocket,
        ));

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Feed session cancelled");
                break;
            }

            self.set_state(ConnectionState::Connecting);

            match self
                .connect_and_stream(&mut policy, &mut commands, &events)
                .await
            {
                Ok(()) => {
                    tracing::info!("Feed session closed gracefully");
                    break;
                }
                Err(error) => {
                    if error.is_fatal() {
                        tracing::error!(error = %error, "Fatal feed error; not retrying");
                        let _ = events.send(FeedEvent::Error(error)).await;
                        break;
                    }

                    tracing::warn!(error = %error, "Feed connection error");
                    let _ = events.send(FeedEvent::Error(error)).await;

                    self.set_state(ConnectionState::Reconnecting);

                    if let Some(delay) = policy.next_delay() {
                        let attempt = policy.attempt_count();
                        tracing::info!(
                            attempt,
                            delay_ms = delay.as_millis(),
                            "Reconnecting to feed"
                        );
                        let _ = events.send(FeedEvent::Reconnecting { attempt }).await;

                        tokio::select! {
                            () = self.cancel.cancelled() => {
                                tracing::info!("Feed session cancelled during reconnect delay");
                                break;
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        let attempts = policy.attempt_count();
                        tracing::error!(attempts, "Reconnect attempts exhausted");
                        let _ = events
                            .send(FeedEvent::Error(FeedError::RetryExhausted { attempts }))
                            .await;
                        let _ = events.send(FeedEvent::NoReconnect).await;
                        break;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Closed);
        // `events` drops here; the dispatcher drains and exits.
    }

    /// One connection: handshake, replay, then stream until something ends
    /// it. `Ok(())` only on consumer-initiated close.
    #[allow(clippy::too_many_lines)]
    async fn connect_and_stream(
        &self,
        policy: &mut ReconnectPolicy,
        commands: &mut mpsc::Receiver<Command>,
        events: &mpsc::Sender<FeedEvent>,
    ) -> Result<(), FeedError> {
        tracing::info!(url = %self.config.root_url, "Connecting to feed");

        let (ws_stream, response) = tokio_tungstenite::connect_async(self.config.socket_url())
            .await
            .map_err(classify_connect_error)?;
        let status = response.status().as_u16();

        let (mut write, mut read) = ws_stream.split();

        // Control frames queued against a previous connection are covered
        // by the replay below; drain them before accepting new ones.
        while commands.try_recv().is_ok() {}

        self.set_state(ConnectionState::Connected);
        policy.reset();
        let _ = events.send(FeedEvent::Connected { status }).await;

        // Re-establish the desired subscription state, grouped by mode.
        for request in replay_requests(&self.registry.snapshot()) {
            send_request(&mut write, &request).await?;
        }

        let liveness_state = Arc::new(LivenessState::new());
        let (liveness_tx, mut liveness_rx) = mpsc::channel::<LivenessEvent>(4);
        let liveness_cancel = CancellationToken::new();
        let monitor = LivenessMonitor::new(
            LivenessConfig::from_websocket_settings(&self.config.websocket),
            Arc::clone(&liveness_state),
            liveness_tx,
            liveness_cancel.clone(),
        );
        tokio::spawn(monitor.run());

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    liveness_cancel.cancel();
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                event = liveness_rx.recv() => {
                    if matches!(event, Some(LivenessEvent::Stale)) {
                        liveness_cancel.cancel();
                        return Err(FeedError::LivenessTimeout);
                    }
                }
                command = commands.recv() => {
                    if let Some(Command::Send(request)) = command {
                        if let Err(error) = send_request(&mut write, &request).await {
                            liveness_cancel.cancel();
                            return Err(error);
                        }
                    }
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Binary(data))) => {
                            liveness_state.record_frame();
                            match self.codec.decode_ticks(&data) {
                                Ok(ticks) => {
                                    if !ticks.is_empty() {
                                        let _ = events.send(FeedEvent::Ticks(ticks)).await;
                                    }
                                }
                                Err(error) => {
                                    tracing::warn!(
                                        error = %error,
                                        frame_len = data.len(),
                                        "Dropped undecodable tick frame"
                                    );
                                    let _ = events
                                        .send(FeedEvent::Error(FeedError::Decode(error)))
                                        .await;
                                }
                            }
                        }
                        Some(Ok(Message::Text(text))) => {
                            liveness_state.record_frame();
                            match self.codec.decode_control(&text) {
                                Ok(message) if message.is_credential_rejection() => {
                                    liveness_cancel.cancel();
                                    let reason = message
                                        .error_text()
                                        .unwrap_or_default()
                                        .to_string();
                                    return Err(FeedError::AuthenticationRejected(reason));
                                }
                                Ok(message) if message.is_error() => {
                                    let text =
                                        message.error_text().unwrap_or_default().to_string();
                                    tracing::warn!(error = %text, "Feed error message");
                                    let _ = events
                                        .send(FeedEvent::Error(FeedError::Server(text)))
                                        .await;
                                }
                                Ok(message) => {
                                    let _ = events.send(FeedEvent::Message(message)).await;
                                }
                                Err(error) => {
                                    tracing::warn!(
                                        error = %error,
                                        "Dropped undecodable control message"
                                    );
                                    let _ = events
                                        .send(FeedEvent::Error(FeedError::Decode(error)))
                                        .await;
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            liveness_state.record_frame();
                            if let Err(error) = write.send(Message::Pong(data)).await {
                                liveness_cancel.cancel();
                                return Err(error.into());
                            }
                        }
                        Some(Ok(Message::Pong(_))) => {
                            liveness_state.record_frame();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            liveness_cancel.cancel();
                            let (code, reason) = frame.map_or_else(
                                || (CLOSE_CODE_ABSENT, String::new()),
                                |f| (u16::from(f.code), f.reason.to_string()),
                            );
                            tracing::info!(code, reason = %reason, "Server closed the connection");
                            let _ = events
                                .send(FeedEvent::Closed {
                                    code,
                                    reason: reason.clone(),
                                })
                                .await;
                            return if is_auth_close_code(code) {
                                Err(FeedError::AuthenticationRejected(reason))
                            } else {
                                Err(FeedError::ConnectionClosed)
                            };
                        }
                        Some(Ok(_)) => {
                            // Raw frame variants never surface from this client.
                        }
                        Some(Err(error)) => {
                            liveness_cancel.cancel();
                            return Err(error.into());
                        }
                        None => {
                            liveness_cancel.cancel();
                            tracing::info!("WebSocket stream ended");
                            return Err(FeedError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Serialize and send one control frame.
async fn send_request<W>(write: &mut W, request: &TickerRequest) -> Result<(), FeedError>
where
    W: SinkExt<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    let json = serde_json::to_string(request)
        .map_err(|e| FeedError::ConnectionFailed(format!("failed to serialize request: {e}")))?;

    tracing::debug!(request = %json, "Sending control frame");

    write.send(Message::Text(json.into())).await.map_err(|e| {
        FeedError::ConnectionFailed(format!("failed to send control frame: {e}"))
    })?;

    Ok(())
}

/// Separate fatal credential rejections from retryable handshake failures.
fn classify_connect_error(error: tokio_tungstenite::tungstenite::Error) -> FeedError {
    use tokio_tungstenite::tungstenite::Error;

    match error {
        Error::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            FeedError::AuthenticationRejected(format!(
                "handshake rejected with HTTP {}",
                response.status()
            ))
        }
        other => FeedError::ConnectionFailed(other.to_string()),
    }
}

/// Close codes the feed uses to reject a session's credentials.
const fn is_auth_close_code(code: u16) -> bool {
    // 1008: policy violation, sent for invalid or expired tokens.
    code == 1008
}

/// Dispatcher: translates events into handler callbacks, one at a time, in
/// order. Exits when the driver drops its sender.
async fn dispatch_events(handler: Arc<dyn FeedHandler>, mut events: mpsc::Receiver<FeedEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            FeedEvent::Connected { status } => handler.on_connect(status),
            FeedEvent::Ticks(ticks) => handler.on_ticks(ticks),
            FeedEvent::Message(message) => handler.on_message(message),
            FeedEvent::Error(error) => handler.on_error(&error),
            FeedEvent::Closed { code, reason } => handler.on_close(code, &reason),
            FeedEvent::Reconnecting { attempt } => handler.on_reconnect(attempt),
            FeedEvent::NoReconnect => handler.on_noreconnect(),
        }
    }
}
