#![forbid(unsafe_code)]

//! Opt-in diagnostics via `tracing-subscriber`.
//!
//! Nothing is installed unless `TERMSAVER_LOG` is set. Events go to stderr
//! so stdout carries only frames; redirect stderr to a file to keep the
//! animation clean (`TERMSAVER_LOG=debug termsaver 2>termsaver.log`).

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "TERMSAVER_LOG";

/// Install a stderr subscriber if `TERMSAVER_LOG` is set.
///
/// Returns whether a subscriber was installed.
pub fn init_from_env() -> bool {
    match std::env::var(LOG_ENV) {
        Ok(directives) => init(&directives),
        Err(_) => false,
    }
}

/// Install a stderr subscriber filtered by `directives`.
///
/// Malformed directives fall back to `info`. Returns `false` if a global
/// subscriber is already set.
pub fn init(directives: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(directives))
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .try_init()
        .is_ok()
}

fn filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}
