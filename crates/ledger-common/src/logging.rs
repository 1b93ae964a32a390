//! Tracing subscriber setup, following the pattern laid out by the account
//! model's logging crate: a single `init` entry point, `RUST_LOG`-driven
//! filtering, and a `whoami` field stamped onto the startup event so logs
//! from several `ledgerd` instances in one aggregator can be told apart.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

pub struct LoggerConfig {
    whoami: String,
}

impl LoggerConfig {
    pub fn new(whoami: String) -> Self {
        Self { whoami }
    }
}

/// Installs a global `tracing` subscriber: compact stdout formatting,
/// filtered by `RUST_LOG` (or `info` if unset). Call once, at process
/// startup.
pub fn init(config: LoggerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout = tracing_subscriber::fmt::layer().compact().with_filter(filter);

    tracing_subscriber::registry().with(stdout).init();

    info!(whoami = %config.whoami, "logging started");
}
