//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so that `--json` output on stdout stays parseable.
//!
//! - default: warn (rule configuration problems, unparseable dates)
//! - `-v`: info (phase progress and counts)
//! - `-vv`: debug
//! - `-vvv`: trace
//!
//! `RUST_LOG` overrides the flags when set.

use std::io;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map the `-v` count to a level.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init(verbosity: u8) {
    let level = level_from_verbosity(verbosity);

    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(
            fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(verbosity >= 2)
                .without_time(),
        )
        .init();
}

/// Build an `EnvFilter` from the given level, respecting `RUST_LOG`.
fn build_env_filter(level: Level) -> EnvFilter {
    let level = level.as_str().to_lowercase();
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Dependencies stay at warn.
        EnvFilter::new(format!("warn,assay={level},assay_cli={level}"))
    })
}
