// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The service provider builder.
//!
//! Collects explicit components and DSL customizations, then runs one build:
//!
//! ```text
//! Unbuilt → Registering → Reordering → Configuring → Assembling → Built
//!                                  ╰──────── any error ────────→ Failed
//! ```
//!
//! `Built` and `Failed` are terminal; a builder produces at most one pipeline.

mod ordering;
mod registry;


pub use ordering::sort_units;
pub use registry::ConfigurerRegistry;

use std::any::Any;
use std::sync::Arc;

use crate::assembler::{Pipeline, PipelineAssembler};
use crate::config::SamlProperties;
use crate::configurer::{
    AuthenticationProviderConfigurer, BuildContext, Configurer, ContextProviderConfigurer, Facet, FacetUnit,
    KeyManagerConfigurer, LocalExtendedMetadataConfigurer, LogoutConfigurer, MetadataGeneratorConfigurer,
    MetadataManagerConfigurer, ProcessorConfigurer, RemoteExtendedMetadataConfigurer, SingleLogoutProfileConfigurer,
    SsoConfigurer, TlsConfigurer, WebSsoProfileConfigurer, WebSsoProfileConsumerConfigurer,
    WebSsoProfileEcpConfigurer, WebSsoProfileHokConfigurer, WebSsoProfileHokConsumerConfigurer,
};
use crate::endpoints::{EndpointRegistry, LazyRequestMatcher, SharedEndpoints};
use crate::error::BuildError;
use crate::logging::{self, BuildInfo, log_error, structured};
use crate::resources::{DefaultResourceLoader, ResourceLoader};
use crate::store::SharedObjectStore;
use crate::{debug_fmt, error_fmt, info_fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Unbuilt,
    Registering,
    Reordering,
    Configuring,
    Assembling,
    Built,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Built | BuildState::Failed)
    }
}

/// Composes a SAML service provider pipeline.
#[derive(Debug)]
pub struct ServiceProviderBuilder {
    state: BuildState,
    registry: ConfigurerRegistry,
    store: SharedObjectStore,
    endpoints: SharedEndpoints,
    matcher: LazyRequestMatcher,
    properties: SamlProperties,
    resources: Arc<dyn ResourceLoader>,
    rejected: Vec<&'static str>,
}

macro_rules! facet_accessors {
    ($($(#[$doc:meta])* $name:ident => $facet:ty),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, customize: impl FnOnce(&mut $facet)) -> &mut Self {
                self.facet::<$facet>(customize)
            }
        )*
    };
}

impl ServiceProviderBuilder {
    pub fn new(properties: SamlProperties) -> Self {
        Self::with_resource_loader(properties, Arc::new(DefaultResourceLoader::default()))
    }

    pub fn with_resource_loader(properties: SamlProperties, resources: Arc<dyn ResourceLoader>) -> Self {
        let endpoints = EndpointRegistry::shared();
        Self {
            state: BuildState::Unbuilt,
            registry: ConfigurerRegistry::new(),
            store: SharedObjectStore::new(),
            matcher: LazyRequestMatcher::new(Arc::clone(&endpoints)),
            endpoints,
            properties,
            resources,
            rejected: Vec::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn endpoints(&self) -> &SharedEndpoints {
        &self.endpoints
    }

    pub fn registry(&self) -> &ConfigurerRegistry {
        &self.registry
    }

    /// Matcher over the public endpoints; usable before the build runs.
    pub fn request_matcher(&self) -> LazyRequestMatcher {
        self.matcher.clone()
    }

    fn touch(&mut self) {
        if self.state == BuildState::Unbuilt {
            self.state = BuildState::Registering;
        }
    }

    /// Register a ready-made component; the matching unit leaves it untouched.
    pub fn register_component<T: Any + Send + Sync>(&mut self, component: T) -> Result<&mut Self, BuildError> {
        if self.state.is_terminal() {
            return Err(BuildError::AlreadyBuilt);
        }
        self.touch();
        self.store.register(component)?;
        Ok(self)
    }

    /// Add a configurer unit unless one of its type exists; returns the registered unit.
    pub fn apply<C: Configurer>(&mut self, unit: C) -> Result<&mut C, BuildError> {
        if self.state.is_terminal() {
            return Err(BuildError::AlreadyBuilt);
        }
        self.touch();
        Ok(self.registry.apply(unit))
    }

    /// Customize the DSL of any facet.
    ///
    /// After a terminal state the closure is not run; the facet name is
    /// recorded in [`rejected_customizations`](Self::rejected_customizations)
    /// and [`ensure_open`](Self::ensure_open) reports it.
    pub fn facet<F: Facet>(&mut self, customize: impl FnOnce(&mut F)) -> &mut Self {
        if self.state.is_terminal() {
            error_fmt!("Builder", "Ignoring {} customization after the build ({:?})", F::NAME, self.state);
            self.rejected.push(F::NAME);
            return self;
        }
        self.touch();
        customize(self.registry.apply_default::<FacetUnit<F>>().facet_mut());
        self
    }

    /// Facets customized after the build reached a terminal state.
    pub fn rejected_customizations(&self) -> &[&'static str] {
        &self.rejected
    }

    /// Fails with [`BuildError::AlreadyBuilt`] once the builder is terminal
    /// or a DSL call was made after that.
    pub fn ensure_open(&self) -> Result<(), BuildError> {
        if self.state.is_terminal() || !self.rejected.is_empty() {
            return Err(BuildError::AlreadyBuilt);
        }
        Ok(())
    }

    facet_accessors! {
        key_manager => KeyManagerConfigurer,
        tls => TlsConfigurer,
        remote_extended_metadata => RemoteExtendedMetadataConfigurer,
        local_extended_metadata => LocalExtendedMetadataConfigurer,
        metadata_manager => MetadataManagerConfigurer,
        authentication_provider => AuthenticationProviderConfigurer,
        context_provider => ContextProviderConfigurer,
        processor => ProcessorConfigurer,
        web_sso_profile_consumer => WebSsoProfileConsumerConfigurer,
        web_sso_profile_hok_consumer => WebSsoProfileHokConsumerConfigurer,
        web_sso_profile => WebSsoProfileConfigurer,
        web_sso_profile_ecp => WebSsoProfileEcpConfigurer,
        web_sso_profile_hok => WebSsoProfileHokConfigurer,
        single_logout_profile => SingleLogoutProfileConfigurer,
        logout => LogoutConfigurer,
        sso => SsoConfigurer,
        metadata_generator => MetadataGeneratorConfigurer,
    }

    /// Re-apply every built-in unit in the fixed stage order.
    fn before_build(&mut self) {
        let registry = &mut self.registry;
        registry.reapply::<FacetUnit<KeyManagerConfigurer>>();
        registry.reapply::<FacetUnit<TlsConfigurer>>();
        registry.reapply::<FacetUnit<RemoteExtendedMetadataConfigurer>>();
        registry.reapply::<FacetUnit<LocalExtendedMetadataConfigurer>>();
        registry.reapply::<FacetUnit<MetadataManagerConfigurer>>();
        registry.reapply::<FacetUnit<AuthenticationProviderConfigurer>>();
        registry.reapply::<FacetUnit<ContextProviderConfigurer>>();
        registry.reapply::<FacetUnit<ProcessorConfigurer>>();
        registry.reapply::<FacetUnit<WebSsoProfileConsumerConfigurer>>();
        registry.reapply::<FacetUnit<WebSsoProfileHokConsumerConfigurer>>();
        registry.reapply::<FacetUnit<WebSsoProfileConfigurer>>();
        registry.reapply::<FacetUnit<WebSsoProfileEcpConfigurer>>();
        registry.reapply::<FacetUnit<WebSsoProfileHokConfigurer>>();
        registry.reapply::<FacetUnit<SingleLogoutProfileConfigurer>>();
        registry.reapply::<FacetUnit<LogoutConfigurer>>();
        registry.reapply::<FacetUnit<SsoConfigurer>>();
        registry.reapply::<FacetUnit<MetadataGeneratorConfigurer>>();
    }

    /// Run the build. A builder builds once; later calls fail with
    /// [`BuildError::AlreadyBuilt`].
    pub async fn build(&mut self) -> Result<Pipeline, BuildError> {
        if self.state.is_terminal() {
            return Err(BuildError::AlreadyBuilt);
        }

        let build = BuildInfo::new();
        info_fmt!("Builder", "Starting pipeline build {}", build.build_id);

        match self.perform_build(&build).await {
            Ok(pipeline) => {
                self.state = BuildState::Built;
                info_fmt!(
                    "Builder",
                    "Pipeline build {} finished in {} ms",
                    build.build_id,
                    build.elapsed_ms()
                );
                if logging::is_structured_logging() {
                    let logger = structured::with_build_context(&slog_scope::logger(), &build);
                    slog::info!(logger, "pipeline built";
                        "filters" => pipeline.chain().len(),
                        "public_patterns" => pipeline.matcher().patterns().len());
                }
                Ok(pipeline)
            }
            Err(err) => {
                self.state = BuildState::Failed;
                Err(log_error("Builder", err))
            }
        }
    }

    async fn perform_build(&mut self, build: &BuildInfo) -> Result<Pipeline, BuildError> {
        self.state = BuildState::Reordering;
        self.before_build();
        let mut units = sort_units(self.registry.take_units())?;
        let configurer_order: Vec<&'static str> = units.iter().map(|unit| unit.name()).collect();
        debug_fmt!("Builder", "Configurer order: {}", configurer_order.join(" -> "));

        self.state = BuildState::Configuring;
        let mut store = std::mem::take(&mut self.store);
        let configured = self.configure_units(&mut units, &mut store).await;
        self.registry.restore_units(units);
        configured?;

        self.state = BuildState::Assembling;
        PipelineAssembler::new(store, Arc::clone(&self.endpoints), self.matcher.clone())
            .assemble(build, configurer_order)
    }

    async fn configure_units(
        &self,
        units: &mut [Box<dyn Configurer>],
        store: &mut SharedObjectStore,
    ) -> Result<(), BuildError> {
        let mut ctx = BuildContext {
            store,
            endpoints: &self.endpoints,
            properties: &self.properties,
            resources: self.resources.as_ref(),
        };

        for unit in units.iter_mut() {
            unit.init(&ctx)?;
        }
        for unit in units.iter_mut() {
            debug_fmt!("Builder", "Configuring {} (rank {})", unit.name(), unit.rank());
            unit.configure(&mut ctx).await?;
        }
        Ok(())
    }
}
