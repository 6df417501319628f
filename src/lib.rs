// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! samlsp - configuration-driven composition of SAML 2.0 service provider pipelines
//!
//! samlsp assembles the security pipeline of a SAML service provider (key
//! material, metadata, profiles, SSO/logout filters and the public endpoint
//! matcher) from three layers of input:
//!
//! 1. **explicit components** registered on the builder, used as-is;
//! 2. **DSL** customizations, one accessor per facet;
//! 3. **property defaults** read lazily from layered providers under `saml.`.
//!
//! # Build lifecycle
//!
//! Every facet is a configurer unit. A build re-applies the built-in units in
//! a fixed stage order, verifies that order against the units' declared
//! dependencies, runs `init` on every unit and then `configure`, and finally
//! hands the published artifacts to the assembler. A builder builds once.
//!
//! ```rust,no_run
//! use samlsp::{SamlProperties, ServiceProviderBuilder};
//!
//! # async fn run() -> Result<(), samlsp::BuildError> {
//! let mut builder = ServiceProviderBuilder::new(SamlProperties::default());
//! builder
//!     .key_manager(|keys| {
//!         keys.store_location("classpath:keys/sp.pem").store_pass("changeit");
//!     })
//!     .metadata_manager(|metadata| {
//!         metadata.metadata_location("https://idp.example.com/metadata");
//!     })
//!     .metadata_generator(|generator| {
//!         generator.entity_id("urn:example:sp");
//!     })
//!     .sso(|sso| {
//!         sso.sso_processing_url("/custom/sso");
//!     });
//!
//! let pipeline = builder.build().await?;
//! assert!(pipeline.matcher().matches("/custom/sso"));
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration System
//!
//! Property defaults come from an ordered stack of [`ConfigProvider`]s (file,
//! environment, custom); later providers override earlier ones. The
//! [`ServiceProviderLoader`] wires the usual stack together.

pub mod assembler;
pub mod builder;
pub mod config;
pub mod configurer;
pub mod endpoints;
pub mod error;
pub mod loader;
pub mod logging;
pub mod resources;
pub mod saml;
pub mod store;

pub use assembler::{Access, Pipeline, PipelineDescription, SecurityFilterChain};
pub use builder::{BuildState, ServiceProviderBuilder};
pub use config::{Config, ConfigError, ConfigProvider, ConfigProviderExt, SamlProperties};
pub use configurer::{Configurer, Facet, FacetUnit};
pub use endpoints::{Endpoint, LazyRequestMatcher};
pub use error::{BuildError, KeyError, ResourceError};
pub use loader::{LoaderError, ServiceProvider, ServiceProviderLoader};
pub use resources::{DefaultResourceLoader, ResourceLoader};
pub use store::SharedObjectStore;
