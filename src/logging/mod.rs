// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Logging setup for the service provider builder.
//!
//! Everything logs through the `log` facade (see the `*_fmt!` macros). The
//! backend is installed once per process: `env_logger` by default, or a
//! `slog` drain bridged through `slog-stdlog` when `saml.logging.structured`
//! is set.

pub mod config;
pub mod structured;
mod wrapper;

#[cfg(test)]
pub(crate) mod test_logger;
#[cfg(test)]
mod tests;

pub use config::{LogLevel, LoggingConfig};
pub use structured::{BuildInfo, LoggerGuard};

use log::LevelFilter;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

static INIT: Once = Once::new();
static USING_STRUCTURED: AtomicBool = AtomicBool::new(false);

/// `env_logger` at `level`; `RUST_LOG` wins.
fn init_env_logger(level: LevelFilter) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", level.as_str().to_lowercase());

    // try_init: a test harness may already own the global logger
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_target(true)
        .try_init();

    log::info!("Logging initialized at level: {}", log::max_level());
}

/// Initialize logging from `saml.logging`.
///
/// Returns the guard of the global structured logger, which must be kept
/// alive for as long as structured output is wanted.
pub fn init_with_config(config: &LoggingConfig) -> Option<LoggerGuard> {
    let level = config.level.filter();
    let mut guard = None;

    INIT.call_once(|| {
        if config.structured {
            let installed = structured::init_global_logger(&config.to_logger_config());
            if installed.is_bridged() {
                log::set_max_level(level);
                USING_STRUCTURED.store(true, Ordering::SeqCst);
            }
            guard = Some(installed);
        } else {
            init_env_logger(level);
        }
    });

    guard
}

/// Whether log records are forwarded to a structured `slog` drain.
pub fn is_structured_logging() -> bool {
    USING_STRUCTURED.load(Ordering::SeqCst)
}

/// Log an error with context and hand it back, for use in `map_err` chains.
pub fn log_error<E: std::fmt::Display>(context: &str, err: E) -> E {
    log::error!("[{}] {}", context, err);
    err
}
