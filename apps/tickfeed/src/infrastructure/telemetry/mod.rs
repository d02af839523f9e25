//! Tracing Initialization
//!
//! Configures a `tracing-subscriber` fmt layer with environment-driven
//! filtering. The library itself only emits `tracing` events; exporters are
//! the embedding application's concern.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `tickfeed=info`)
//!
//! # Usage
//!
//! ```ignore
//! use tickfeed::infrastructure::telemetry;
//!
//! // Initialize once at startup.
//! telemetry::init();
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the tracing subscriber.
///
/// Safe to call only once per process; later calls are ignored.
#[allow(clippy::expect_used)]
pub fn init() {
    let env_filter = EnvFilter::from_default_env().add_directive(
        "tickfeed=info"
            .parse()
            .expect("static directive 'tickfeed=info' is valid"),
    );

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
