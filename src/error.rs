// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors raised while composing a service provider pipeline.
//!
//! Every variant is a configuration-time failure: the build aborts and the
//! error is returned to the integrator. Nothing here is retried.

use std::io;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure to read a key file or metadata document.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("unsupported resource scheme '{0}'")]
    UnsupportedScheme(String),
}

/// Invalid key material.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("no certificate found in '{0}'")]
    MissingCertificate(String),

    #[error("private key does not match the certificate for alias '{0}'")]
    Mismatch(String),

    #[error("unknown key alias '{0}'")]
    UnknownAlias(String),
}

/// Errors that abort a pipeline build.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A required attribute was absent from all three precedence tiers.
    #[error("{facet}: missing required value '{attribute}'")]
    MissingValue { facet: String, attribute: String },

    /// Two units claimed the same endpoint.
    #[error("endpoint {endpoint} claimed by {claimant} is already owned by {owner}")]
    EndpointConflict {
        endpoint: String,
        owner: String,
        claimant: String,
    },

    /// An endpoint pattern could not be compiled.
    #[error("invalid endpoint pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Two explicit components of the same type were registered.
    #[error("a component of type {0} is already registered")]
    DuplicateComponent(&'static str),

    /// Two configurers publish the same artifact type.
    #[error("configurers {first} and {second} both provide {artifact}")]
    DuplicateProvider {
        artifact: String,
        first: String,
        second: String,
    },

    /// The declared configurer dependencies contain a cycle.
    #[error("configurer dependency cycle between: {0}")]
    OrderingCycle(String),

    /// A configurer was driven out of its init → configure sequence.
    #[error("{unit}: lifecycle violation: {message}")]
    Lifecycle { unit: String, message: String },

    /// `build` was called on a builder that already built (or failed).
    #[error("service provider pipeline has already been built")]
    AlreadyBuilt,

    /// The assembler found no artifact of a type it needs.
    #[error("no artifact of type {0} was published")]
    MissingArtifact(&'static str),

    /// A component's finish-initialization hook rejected its wiring.
    #[error("{component} failed to initialize: {message}")]
    Initialization {
        component: &'static str,
        message: String,
    },

    /// Loading a key file or metadata document failed.
    #[error("failed to load resource '{location}': {source}")]
    Resource {
        location: String,
        #[source]
        source: ResourceError,
    },

    /// Key material was unreadable or inconsistent.
    #[error("{facet}: invalid key material: {source}")]
    Key {
        facet: String,
        #[source]
        source: KeyError,
    },

    /// The filter chain could not accept a filter.
    #[error("filter chain error: {0}")]
    FilterChain(String),

    /// A property value could not be read.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BuildError {
    pub fn missing(facet: &str, attribute: &str) -> Self {
        Self::MissingValue {
            facet: facet.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn resource(location: &str, source: impl Into<ResourceError>) -> Self {
        Self::Resource {
            location: location.to_string(),
            source: source.into(),
        }
    }

    pub fn key(facet: &str, source: impl Into<KeyError>) -> Self {
        Self::Key {
            facet: facet.to_string(),
            source: source.into(),
        }
    }

    pub fn init(component: &'static str, message: impl Into<String>) -> Self {
        Self::Initialization {
            component,
            message: message.into(),
        }
    }

    /// True for the configuration-error class (as opposed to resource loading).
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::Resource { .. } | Self::Key { .. })
    }
}
