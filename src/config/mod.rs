// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property subsystem
//!
//! Property defaults are the *lowest* precedence tier of every configurer:
//! they are only consulted when neither an explicit component nor a DSL value
//! supplied an attribute. The subsystem is **pluggable**.  A service provider
//! is built from an ordered list of [`ConfigProvider`]s; later providers
//! override earlier ones.  Typical stacking order looks like this:
//!
//! 1. `FileConfigProvider` – `samlsp.{toml,json,yaml}`
//! 2. `EnvConfigProvider`  – `SAMLSP_SAML__SSO__SSO_LOGIN_URL=/login`
//! 3. *your* provider implementing [`ConfigProvider`]
//!
//! All SAML keys live below the `saml.` root, one section per facet:
//!
//! | section | owner |
//! |---------|-------|
//! | `saml.key_manager`              | key material            |
//! | `saml.tls`                      | transport security      |
//! | `saml.extended_metadata.remote` | remote extended metadata|
//! | `saml.extended_metadata.local`  | local extended metadata |
//! | `saml.metadata_manager`         | metadata manager        |
//! | `saml.authentication_provider`  | authentication provider |
//! | `saml.context_provider`         | context provider        |
//! | `saml.processor`                | SAML processor bindings |
//! | `saml.sso`                      | SSO handling            |
//! | `saml.logout`                   | logout handling         |
//! | `saml.metadata_generator`       | metadata generator      |
//!
//! See [`properties`] for every key and its documented default.

mod env;
pub mod error;
mod file;
pub mod properties;


pub use env::EnvConfigProvider;
pub use error::ConfigError;
pub use file::FileConfigProvider;
pub use properties::SamlProperties;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Core configuration provider trait that all property sources must implement.
/// This trait is object-safe since it doesn't contain generic methods.
pub trait ConfigProvider: Debug + Send + Sync {
    /// Check if the configuration provider has a value for the given key.
    fn has(&self, key: &str) -> bool;

    /// Get the name of the configuration provider for debugging purposes.
    fn provider_name(&self) -> &str;

    /// Get a raw configuration value by key.
    /// Returns a JSON Value that can be later deserialized into specific types.
    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError>;
}

/// Extension trait for ConfigProvider that provides methods for typed access.
/// This trait is not object-safe because it has generic methods.
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a configuration value by key and deserialize it to the specified type.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get_raw(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ConfigError::invalid_value(key, e)),
            None => Ok(None),
        }
    }
}

impl<T: ConfigProvider> ConfigProviderExt for T {}

/// Builder for the configuration system.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration provider.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add an already shared configuration provider.
    pub fn with_shared_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        Config {
            providers: self.providers,
        }
    }
}

/// Holds all providers and handles retrieving values.
#[derive(Debug, Clone, Default)]
pub struct Config {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl Config {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// An empty configuration; every lookup falls through to documented defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        // Later providers (higher index) override earlier ones
        for provider in self.providers.iter().rev() {
            if provider.has(key) {
                return provider.get_raw(key);
            }
        }
        Ok(None)
    }

    /// Get a configuration value by key. The last provider holding the key wins.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get_raw(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ConfigError::invalid_value(key, e)),
            None => Ok(None),
        }
    }

    /// Get a configuration value by key with a default fallback value.
    pub fn get_or_default<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        match self.get(key)? {
            Some(value) => Ok(value),
            None => Ok(default),
        }
    }

    /// Names of the registered providers, lowest priority first.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider_name()).collect()
    }

    /// Create a default configuration using the file-based provider.
    pub fn default_file(file_path: &str) -> Result<Self, ConfigError> {
        let provider = FileConfigProvider::new(file_path)?;
        Ok(Self::builder().with_provider(provider).build())
    }
}
