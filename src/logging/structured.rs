// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured logging through slog, with per-build context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slog::{Drain, Logger, o};
use slog_async::Async;
use slog_json::Json;
use slog_term::{FullFormat, TermDecorator};
use std::collections::BTreeMap;
use std::io;
use uuid::Uuid;

/// Structured logging format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable terminal output
    #[default]
    Terminal,
    /// JSON formatted output
    Json,
}

/// Structured logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LogFormat,
    pub level: slog::Level,
    /// Static key-value pairs included in every record
    pub static_fields: BTreeMap<String, String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Terminal,
            level: slog::Level::Info,
            static_fields: BTreeMap::new(),
        }
    }
}

/// Create a structured logger with the given configuration
pub fn create_logger(config: &LoggerConfig) -> Logger {
    let logger = match config.format {
        LogFormat::Terminal => {
            let decorator = TermDecorator::new().build();
            let drain = FullFormat::new(decorator).build().fuse();
            let drain = drain.filter_level(config.level).fuse();
            Logger::root(Async::new(drain).build().fuse(), o!())
        }
        LogFormat::Json => {
            let drain = Json::new(io::stdout()).add_default_keys().build().fuse();
            let drain = drain.filter_level(config.level).fuse();
            Logger::root(Async::new(drain).build().fuse(), o!())
        }
    };

    if config.static_fields.is_empty() {
        return logger;
    }
    let fields: Vec<String> = config
        .static_fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    logger.new(o!("static" => fields.join(",")))
}

/// Identity of one pipeline build, attached to its log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub build_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildInfo {
    pub fn new() -> Self {
        Self {
            build_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since the build started.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds().max(0)
    }
}

/// Child logger carrying the build context.
pub fn with_build_context(logger: &Logger, build: &BuildInfo) -> Logger {
    logger.new(o!(
        "build_id" => build.build_id.to_string(),
        "started_at" => build.started_at.to_rfc3339(),
    ))
}

/// Keeps the global structured logger installed.
pub struct LoggerGuard {
    _guard: slog_scope::GlobalLoggerGuard,
    bridged: bool,
}

impl LoggerGuard {
    /// Whether `log` records are forwarded to this logger.
    pub fn is_bridged(&self) -> bool {
        self.bridged
    }
}

/// Install the global structured logger and bridge the `log` facade to it.
pub fn init_global_logger(config: &LoggerConfig) -> LoggerGuard {
    let guard = slog_scope::set_global_logger(create_logger(config));
    let bridged = slog_stdlog::init().is_ok();

    LoggerGuard {
        _guard: guard,
        bridged,
    }
}
