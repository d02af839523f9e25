//! Liveness Monitor
//!
//! Watchdog for connection staleness. The feed heartbeats at the
//! application layer (a short binary frame every couple of seconds), so a
//! healthy connection never goes quiet. The session records every inbound
//! frame (tick batch, control message, or heartbeat, decodable or not) into
//! [`LivenessState`]; the monitor checks the elapsed time on a timer and
//! signals the session to tear the connection down once it exceeds the
//! staleness window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::WebSocketSettings;

/// Configuration for staleness detection.
#[derive(Debug, Clone)]
pub struct LivenessConfig {
    /// How often the monitor inspects the last-frame clock.
    pub check_interval: Duration,
    /// Quiet period after which the connection is considered dead. Must be
    /// longer than the feed's heartbeat interval.
    pub stale_after: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(1),
            stale_after: Duration::from_secs(10),
        }
    }
}

impl LivenessConfig {
    /// Create configuration from [`WebSocketSettings`].
    #[must_use]
    pub const fn from_websocket_settings(settings: &WebSocketSettings) -> Self {
        Self {
            check_interval: settings.liveness_check_interval,
            stale_after: settings.liveness_timeout,
        }
    }
}

/// Events emitted by the liveness monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessEvent {
    /// No frame arrived within the staleness window; the connection should
    /// be restarted.
    Stale,
}

/// Last-frame clock shared between the receive loop and the monitor.
#[derive(Debug)]
pub struct LivenessState {
    last_frame: RwLock<Instant>,
}

impl Default for LivenessState {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessState {
    /// Create state with the clock starting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame: RwLock::new(Instant::now()),
        }
    }

    /// Record that a frame was observed.
    pub fn record_frame(&self) {
        *self.last_frame.write() = Instant::now();
    }

    /// Time since the last observed frame.
    #[must_use]
    pub fn time_since_frame(&self) -> Duration {
        self.last_frame.read().elapsed()
    }

    /// Restart the clock for a new connection.
    pub fn reset(&self) {
        *self.last_frame.write() = Instant::now();
    }
}

/// Watchdog task that signals staleness exactly once, then exits.
pub struct LivenessMonitor {
    config: LivenessConfig,
    state: Arc<LivenessState>,
    event_tx: mpsc::Sender<LivenessEvent>,
    cancel: CancellationToken,
}

impl LivenessMonitor {
    /// Create a new monitor.
    #[must_use]
    pub const fn new(
        config: LivenessConfig,
        state: Arc<LivenessState>,
        event_tx: mpsc::Sender<LivenessEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            state,
            event_tx,
            cancel,
        }
    }

    /// Run the staleness check loop until cancelled or a staleness event
    /// has been sent.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.check_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Liveness monitor cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let elapsed = self.state.time_since_frame();
                    if elapsed > self.config.stale_after {
                        tracing::warn!(
                            elapsed_secs = elapsed.as_secs(),
                            stale_after_secs = self.config.stale_after.as_secs(),
                            "No frames within staleness window"
                        );
                        let _ = self.event_tx.send(LivenessEvent::Stale).await;
                        break;
                    }
                }
            }
        }
    }
}
