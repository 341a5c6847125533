//! Logging setup.
//!
//! The crate emits through both facades: `log` for plain messages and
//! `tracing` for spans around longer operations (BVH builds, target
//! resizes). [`init_logging`] installs handlers for both, filtered by
//! the usual `RUST_LOG` variable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install log and tracing handlers. Call once at startup; later calls
/// are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
