// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the property subsystem.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading property sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A property exists but does not deserialize into the requested type.
    #[error("invalid value for property '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// A property file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file extension is not one of json, toml, yaml or yml.
    #[error("unsupported property file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A property document is malformed.
    #[error("invalid {format} document: {message}")]
    Syntax { format: &'static str, message: String },

    /// An error reported by a custom provider.
    #[error("provider error: {provider}: {message}")]
    ProviderError { provider: String, message: String },
}

impl ConfigError {
    pub fn invalid_value(key: &str, message: impl fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn syntax(format: &'static str, message: impl fmt::Display) -> Self {
        Self::Syntax {
            format,
            message: message.to_string(),
        }
    }

    /// Create a new provider error.
    pub fn provider_error<P: fmt::Display, M: fmt::Display>(provider: P, message: M) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io::ErrorKind;

    #[test]
    fn test_invalid_value_names_the_key() {
        let error = ConfigError::invalid_value("saml.sso.enable_sso_hok", "expected a boolean");
        assert_eq!(
            error.to_string(),
            "invalid value for property 'saml.sso.enable_sso_hok': expected a boolean"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_read_error_keeps_source() {
        let error = ConfigError::Read {
            path: PathBuf::from("/etc/samlsp.toml"),
            source: io::Error::new(ErrorKind::PermissionDenied, "access denied"),
        };

        assert_eq!(error.to_string(), "failed to read /etc/samlsp.toml: access denied");
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "access denied");
    }

    #[test]
    fn test_provider_error_constructor() {
        let error = ConfigError::provider_error("file", "root must be an object");

        match &error {
            ConfigError::ProviderError { provider, message } => {
                assert_eq!(provider, "file");
                assert_eq!(message, "root must be an object");
            }
            _ => panic!("Expected ProviderError variant"),
        }
        assert_eq!(error.to_string(), "provider error: file: root must be an object");
    }

    #[test]
    fn test_syntax_error() {
        let error = ConfigError::syntax("TOML", "expected '='");
        assert_eq!(error.to_string(), "invalid TOML document: expected '='");
    }
}
