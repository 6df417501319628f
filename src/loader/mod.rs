// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level entry point.
//!
//! The [`ServiceProviderLoader`] stacks the property providers, initializes
//! logging from `saml.logging`, lets the caller customize the builder and
//! returns a [`ServiceProvider`] holding the assembled pipeline.


use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::assembler::Pipeline;
use crate::builder::ServiceProviderBuilder;
use crate::config::{Config, ConfigError, ConfigProvider, EnvConfigProvider, FileConfigProvider, SamlProperties};
use crate::error::BuildError;
use crate::logging::{self, LoggerGuard, LoggingConfig};
use crate::resources::{DefaultResourceLoader, ResourceLoader};
use crate::{info_fmt, warn_fmt};

/// Key of the logging section.
pub const LOGGING_KEY: &str = "saml.logging";

/// Errors that can occur while loading a service provider.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Pipeline build error
    #[error("build error: {0}")]
    BuildError(#[from] BuildError),
}

type Customizer = Box<dyn FnOnce(&mut ServiceProviderBuilder) + Send>;

/// Builder for loading a service provider from layered configuration.
#[derive(Default)]
pub struct ServiceProviderLoader {
    config: Option<Config>,
    config_file_path: Option<String>,
    use_env_vars: bool,
    env_prefix: Option<String>,
    providers: Vec<Arc<dyn ConfigProvider>>,
    resources: Option<Arc<dyn ResourceLoader>>,
    customizers: Vec<Customizer>,
}

impl fmt::Debug for ServiceProviderLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProviderLoader")
            .field("config_file_path", &self.config_file_path)
            .field("use_env_vars", &self.use_env_vars)
            .field("env_prefix", &self.env_prefix)
            .field("providers", &self.providers.len())
            .field("customizers", &self.customizers.len())
            .finish_non_exhaustive()
    }
}

impl ServiceProviderLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a ready-made configuration instead of the provider stack.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a configuration file to load. Relative resource locations resolve
    /// against the file's directory.
    pub fn with_config_file(mut self, file_path: &str) -> Self {
        self.config_file_path = Some(file_path.to_string());
        self
    }

    /// Enable environment variable configuration.
    pub fn with_env_vars(mut self) -> Self {
        self.use_env_vars = true;
        self
    }

    /// Set a custom prefix for environment variables (default is "SAMLSP_").
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.use_env_vars = true;
        self
    }

    /// Add a custom configuration provider; it overrides file and environment.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn with_resource_loader(mut self, resources: Arc<dyn ResourceLoader>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Customize the builder (DSL calls, explicit components, custom units).
    pub fn configure<F>(mut self, customize: F) -> Self
    where
        F: FnOnce(&mut ServiceProviderBuilder) + Send + 'static,
    {
        self.customizers.push(Box::new(customize));
        self
    }

    fn base_dir(&self) -> PathBuf {
        self.config_file_path
            .as_deref()
            .and_then(|path| Path::new(path).parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn build_config(&mut self) -> Result<Config, LoaderError> {
        if let Some(config) = self.config.take() {
            return Ok(config);
        }

        let mut config_builder = Config::builder();

        if let Some(file_path) = &self.config_file_path {
            config_builder = config_builder.with_provider(FileConfigProvider::new(file_path)?);
        }

        if self.use_env_vars {
            let env_provider = match &self.env_prefix {
                Some(prefix) => EnvConfigProvider::new(prefix),
                None => EnvConfigProvider::default(),
            };
            config_builder = config_builder.with_provider(env_provider);
        }

        for provider in self.providers.drain(..) {
            config_builder = config_builder.with_shared_provider(provider);
        }

        Ok(config_builder.build())
    }

    /// Build the configuration, initialize logging and assemble the pipeline.
    pub async fn build(mut self) -> Result<ServiceProvider, LoaderError> {
        let config = Arc::new(self.build_config()?);

        let logging_config = match config.get::<LoggingConfig>(LOGGING_KEY) {
            Ok(found) => found.unwrap_or_default(),
            Err(e) => {
                warn_fmt!("Loader", "Ignoring invalid {}: {}", LOGGING_KEY, e);
                LoggingConfig::default()
            }
        };
        let logger_guard = logging::init_with_config(&logging_config);
        info_fmt!("Loader", "Property providers: {:?}", config.provider_names());

        let resources = match self.resources.take() {
            Some(resources) => resources,
            None => Arc::new(DefaultResourceLoader::new(self.base_dir())),
        };
        let mut builder = ServiceProviderBuilder::with_resource_loader(
            SamlProperties::from_shared(Arc::clone(&config)),
            resources,
        );
        for customize in self.customizers {
            customize(&mut builder);
        }

        let pipeline = builder.build().await?;

        Ok(ServiceProvider {
            config,
            pipeline,
            logger_guard,
        })
    }
}

/// A loaded service provider: the configuration and the pipeline built from it.
pub struct ServiceProvider {
    config: Arc<Config>,
    pipeline: Pipeline,
    logger_guard: Option<LoggerGuard>,
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("build_id", &self.pipeline.build_id())
            .field("structured_logging", &self.logger_guard.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceProvider {
    /// Create a new loader.
    pub fn loader() -> ServiceProviderLoader {
        ServiceProviderLoader::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Whether this service provider installed the structured logger.
    pub fn owns_structured_logger(&self) -> bool {
        self.logger_guard.is_some()
    }
}
