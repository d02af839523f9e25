//! Feed Client Configuration
//!
//! Configuration types for the feed session, loaded from environment
//! variables.

use std::time::Duration;

/// Default WebSocket endpoint of the feed.
pub const DEFAULT_FEED_URL: &str = "wss://ws.kite.trade";

/// Feed API credentials.
///
/// The `Debug` implementation redacts both values for safe logging.
#[derive(Clone)]
pub struct FeedCredentials {
    api_key: String,
    access_token: String,
}

impl FeedCredentials {
    /// Create new credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is empty.
    pub fn new(
        api_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        let access_token = access_token.into();

        if api_key.is_empty() {
            return Err(ConfigError::EmptyValue("FEED_API_KEY".to_string()));
        }
        if access_token.is_empty() {
            return Err(ConfigError::EmptyValue("FEED_ACCESS_TOKEN".to_string()));
        }

        Ok(Self {
            api_key,
            access_token,
        })
    }

    /// The API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The session access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for FeedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCredentials")
            .field("api_key", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// WebSocket connection settings.
#[derive(Debug, Clone)]
pub struct WebSocketSettings {
    /// How often the liveness monitor inspects the last-frame clock.
    pub liveness_check_interval: Duration,
    /// Quiet period after which the connection is considered dead.
    pub liveness_timeout: Duration,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            liveness_check_interval: Duration::from_secs(1),
            liveness_timeout: Duration::from_secs(10),
            reconnect_delay_initial: Duration::from_secs(2),
            reconnect_delay_max: Duration::from_secs(60),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 50,
        }
    }
}

/// Complete feed client configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// API credentials, appended to the connect URL.
    pub credentials: FeedCredentials,
    /// Feed endpoint without query parameters.
    pub root_url: String,
    /// WebSocket connection settings.
    pub websocket: WebSocketSettings,
}

impl FeedConfig {
    /// Create configuration for the default endpoint.
    #[must_use]
    pub fn new(credentials: FeedCredentials) -> Self {
        Self {
            credentials,
            root_url: DEFAULT_FEED_URL.to_string(),
            websocket: WebSocketSettings::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `FEED_API_KEY` or `FEED_ACCESS_TOKEN` is missing
    /// or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("FEED_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("FEED_API_KEY".to_string()))?;

        let access_token = std::env::var("FEED_ACCESS_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("FEED_ACCESS_TOKEN".to_string()))?;

        let root_url =
            std::env::var("FEED_WS_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());

        let websocket = WebSocketSettings {
            liveness_check_interval: parse_env_duration_millis(
                "FEED_LIVENESS_CHECK_INTERVAL_MS",
                WebSocketSettings::default().liveness_check_interval,
            ),
            liveness_timeout: parse_env_duration_secs(
                "FEED_LIVENESS_TIMEOUT_SECS",
                WebSocketSettings::default().liveness_timeout,
            ),
            reconnect_delay_initial: parse_env_duration_millis(
                "FEED_RECONNECT_DELAY_INITIAL_MS",
                WebSocketSettings::default().reconnect_delay_initial,
            ),
            reconnect_delay_max: parse_env_duration_secs(
                "FEED_RECONNECT_DELAY_MAX_SECS",
                WebSocketSettings::default().reconnect_delay_max,
            ),
            reconnect_delay_multiplier: parse_env_f64(
                "FEED_RECONNECT_DELAY_MULTIPLIER",
                WebSocketSettings::default().reconnect_delay_multiplier,
            ),
            max_reconnect_attempts: parse_env_u32(
                "FEED_MAX_RECONNECT_ATTEMPTS",
                WebSocketSettings::default().max_reconnect_attempts,
            ),
        };

        Ok(Self {
            credentials: FeedCredentials::new(api_key, access_token)?,
            root_url,
            websocket,
        })
    }

    /// Full connect URL with credential query parameters.
    ///
    /// Reconnects reuse this exact URL.
    #[must_use]
    pub fn socket_url(&self) -> String {
        format!(
            "{}?api_key={}&access_token={}",
            self.root_url,
            self.credentials.api_key(),
            self.credentials.access_token()
        )
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_reject_empty_values() {
        assert!(FeedCredentials::new("", "token").is_err());
        assert!(FeedCredentials::new("key", "").is_err());
        assert!(FeedCredentials::new("key", "token").is_ok());
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let credentials = FeedCredentials::new("key", "secret-token").unwrap();
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn socket_url_carries_credentials() {
        let credentials = FeedCredentials::new("k123", "t456").unwrap();
        let config = FeedConfig::new(credentials);
        assert_eq!(
            config.socket_url(),
            "wss://ws.kite.trade?api_key=k123&access_token=t456"
        );
    }

    #[test]
    fn socket_url_respects_custom_root() {
        let credentials = FeedCredentials::new("k", "t").unwrap();
        let mut config = FeedConfig::new(credentials);
        config.root_url = "ws://127.0.0.1:9999".to_string();
        assert_eq!(
            config.socket_url(),
            "ws://127.0.0.1:9999?api_key=k&access_token=t"
        );
    }

    #[test]
    fn websocket_defaults() {
        let settings = WebSocketSettings::default();
        assert_eq!(settings.liveness_timeout, Duration::from_secs(10));
        assert_eq!(settings.reconnect_delay_initial, Duration::from_secs(2));
        assert_eq!(settings.reconnect_delay_max, Duration::from_secs(60));
        assert_eq!(settings.max_reconnect_attempts, 50);
    }

    #[test]
    fn parse_helpers_fall_back_to_defaults() {
        // Unset keys fall back; unique names avoid interference.
        assert_eq!(parse_env_u32("TICKFEED_TEST_UNSET_U32", 7), 7);
        assert!((parse_env_f64("TICKFEED_TEST_UNSET_F64", 1.5) - 1.5).abs() < f64::EPSILON);
        assert_eq!(
            parse_env_duration_secs("TICKFEED_TEST_UNSET_SECS", Duration::from_secs(3)),
            Duration::from_secs(3)
        );
        assert_eq!(
            parse_env_duration_millis("TICKFEED_TEST_UNSET_MS", Duration::from_millis(250)),
            Duration::from_millis(250)
        );
    }
}
