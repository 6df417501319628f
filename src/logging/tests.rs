// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(test)]
mod tests {
    use crate::logging::config::{LogLevel, LoggingConfig};
    use crate::logging::structured::{self, BuildInfo, LogFormat};
    use crate::logging::{log_error, test_logger};

    #[test]
    fn test_logging_config_defaults_from_empty_json() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert!(!config.structured);

        let logger_config = config.to_logger_config();
        assert_eq!(logger_config.format, LogFormat::Terminal);
        assert_eq!(logger_config.level, slog::Level::Info);
    }

    #[test]
    fn test_logging_config_json_format_and_level() {
        let config: LoggingConfig = serde_json::from_value(serde_json::json!({
            "structured": true,
            "format": "json",
            "level": "warn",
            "static_fields": { "service": "samlsp" }
        }))
        .unwrap();

        let logger_config = config.to_logger_config();
        assert_eq!(logger_config.format, LogFormat::Json);
        assert_eq!(logger_config.level, slog::Level::Warning);
        assert_eq!(logger_config.static_fields["service"], "samlsp");
        assert_eq!(config.level.filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_logging_config_rejects_unknown_level() {
        let result = serde_json::from_value::<LoggingConfig>(serde_json::json!({ "level": "loud" }));
        assert!(result.is_err());

        let config: LoggingConfig = serde_json::from_value(serde_json::json!({ "level": "warning" })).unwrap();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(LogLevel::Critical.filter(), log::LevelFilter::Error);
    }

    #[test]
    fn test_build_info_context() {
        test_logger::init_test_logger();

        let first = BuildInfo::new();
        let second = BuildInfo::new();
        assert_ne!(first.build_id, second.build_id);
        assert!(first.elapsed_ms() >= 0);

        let logger = structured::with_build_context(&slog_scope::logger(), &first);
        slog::info!(logger, "build started");
    }

    #[test]
    fn test_log_error_returns_error() {
        #[derive(Debug, PartialEq)]
        struct Failure(u16);

        impl std::fmt::Display for Failure {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "failure {}", self.0)
            }
        }

        assert_eq!(log_error("Builder", Failure(7)), Failure(7));
    }
}
