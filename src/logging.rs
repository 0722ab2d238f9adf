//! Log output for the `catindex` binary. Library code only emits `tracing`
//! events; installing a subscriber is left to whoever runs the build.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// The environment variable consulted for a filter directive, e.g.
/// `RUST_LOG=catindex=debug`.
pub const LOG_ENV: &str = "RUST_LOG";

/// Builds the filter: `RUST_LOG` if set and valid, otherwise `default_level`
/// (or `debug` when `verbose`).
pub fn filter(default_level: &str, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { default_level };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs a text subscriber writing to stderr. Returns `false` if a global
/// subscriber was already installed.
pub fn init_logging(verbose: bool) -> bool {
    Registry::default()
        .with(filter("info", verbose))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
