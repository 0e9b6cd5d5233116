//! Tracing subscriber initialization.

use crate::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the filter `init_tracing` installs for `config`.
///
/// `RUST_LOG` wins when it is set and parses; otherwise the configured
/// `trace_level` is used, falling back to `"info"` if it is not a valid
/// directive.
#[must_use]
pub fn filter_for<T>(config: &Config<T>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.trace_level()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a global `fmt` subscriber filtered per [`filter_for`].
///
/// Output goes to stderr without ANSI colors. Idempotent: if a global
/// subscriber is already set (by an earlier call or by the host), this does
/// nothing.
pub fn init_tracing<T>(config: &Config<T>) {
    let subscriber = tracing_subscriber::registry()
        .with(filter_for(config))
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(true));

    if subscriber.try_init().is_ok() {
        tracing::debug!(level = config.trace_level(), "tracing initialized");
    }
}
