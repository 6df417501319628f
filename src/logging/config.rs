// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `saml.logging` settings.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::logging::structured::{LogFormat, LoggerConfig};

/// Severity threshold shared by the `log` facade and the slog drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
    /// slog only; the `log` facade treats it as `error`.
    Critical,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => LevelFilter::Error,
        }
    }

    pub fn slog_level(self) -> slog::Level {
        match self {
            LogLevel::Trace => slog::Level::Trace,
            LogLevel::Debug => slog::Level::Debug,
            LogLevel::Info => slog::Level::Info,
            LogLevel::Warn => slog::Level::Warning,
            LogLevel::Error => slog::Level::Error,
            LogLevel::Critical => slog::Level::Critical,
        }
    }
}

/// Logging section of the property tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Route records through slog instead of env_logger.
    pub structured: bool,
    pub format: LogFormat,
    pub level: LogLevel,
    /// Added to every structured record.
    pub static_fields: BTreeMap<String, String>,
}

impl LoggingConfig {
    pub fn to_logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.format,
            level: self.level.slog_level(),
            static_fields: self.static_fields.clone(),
        }
    }
}
