// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline assembly.
//!
//! Runs once every configurer has published its artifact. The assembler
//! drains the store, injects cross references (only into slots the
//! integrator left empty), runs each component's initialization hook in
//! stage order, inserts the SAML filters after the baseline anchor and seals
//! the endpoint registry.

mod chain;
mod pipeline;

#[cfg(test)]
mod tests;

pub use chain::{ANCHOR_FILTER, BASELINE_FILTERS, SecurityFilterChain};
pub use pipeline::{Access, AccessRule, Components, Pipeline, PipelineDescription};

use chrono::Utc;
use std::any::{Any, type_name};
use std::sync::Arc;

use crate::endpoints::{LazyRequestMatcher, SharedEndpoints, write_registry};
use crate::error::BuildError;
use crate::logging::BuildInfo;
use crate::saml::{
    AuthenticationProvider, Component, KeyManager, LocalExtendedMetadata, LogoutHandling, MetadataDisplayFilter,
    MetadataGenerator, MetadataGeneratorFilter, MetadataManager, RemoteExtendedMetadata, SamlContextProvider,
    SamlProcessor, SecurityFilter, SingleLogoutProfile, SsoHandling, TlsConfiguration, WebSsoProfile,
    WebSsoProfileConsumer, WebSsoProfileEcp, WebSsoProfileHok, WebSsoProfileHokConsumer,
};
use crate::store::SharedObjectStore;
use crate::{debug_fmt, info_fmt};

fn inject<T>(slot: &mut Option<Arc<T>>, value: &Arc<T>) {
    if slot.is_none() {
        *slot = Some(Arc::clone(value));
    }
}

/// Turns the published artifacts of one build into a [`Pipeline`].
#[derive(Debug)]
pub struct PipelineAssembler {
    store: SharedObjectStore,
    endpoints: SharedEndpoints,
    matcher: LazyRequestMatcher,
}

impl PipelineAssembler {
    pub fn new(store: SharedObjectStore, endpoints: SharedEndpoints, matcher: LazyRequestMatcher) -> Self {
        Self {
            store,
            endpoints,
            matcher,
        }
    }

    fn take<T: Any + Send + Sync>(&mut self) -> Result<T, BuildError> {
        self.store
            .take::<T>()
            .ok_or(BuildError::MissingArtifact(type_name::<T>()))
    }

    pub fn assemble(mut self, build: &BuildInfo, configurer_order: Vec<&'static str>) -> Result<Pipeline, BuildError> {
        let key_manager = Arc::new(self.take::<KeyManager>()?);

        let mut tls = self.take::<TlsConfiguration>()?;
        inject(&mut tls.key_manager, &key_manager);
        let tls = Arc::new(tls);

        let remote = Arc::new(self.take::<RemoteExtendedMetadata>()?);
        let local = Arc::new(self.take::<LocalExtendedMetadata>()?);
        let mut generator = self.take::<MetadataGenerator>()?;

        let mut metadata = self.take::<MetadataManager>()?;
        inject(&mut metadata.key_manager, &key_manager);
        inject(&mut metadata.tls, &tls);
        if metadata.hosted_sp_name.is_none() {
            metadata.hosted_sp_name = Some(generator.entity_id.clone());
        }
        let metadata = Arc::new(metadata);

        let mut context = self.take::<SamlContextProvider>()?;
        inject(&mut context.key_manager, &key_manager);
        inject(&mut context.metadata, &metadata);
        let context = Arc::new(context);

        let processor = Arc::new(self.take::<SamlProcessor>()?);

        let mut consumer = self.take::<WebSsoProfileConsumer>()?;
        inject(&mut consumer.processor, &processor);
        inject(&mut consumer.metadata, &metadata);
        let consumer = Arc::new(consumer);

        let mut hok_consumer = self.take::<WebSsoProfileHokConsumer>()?;
        inject(&mut hok_consumer.processor, &processor);
        inject(&mut hok_consumer.metadata, &metadata);
        let hok_consumer = Arc::new(hok_consumer);

        let mut authentication_provider = self.take::<AuthenticationProvider>()?;
        inject(&mut authentication_provider.consumer, &consumer);
        inject(&mut authentication_provider.hok_consumer, &hok_consumer);
        let authentication_provider = Arc::new(authentication_provider);

        macro_rules! profile {
            ($ty:ty) => {{
                let mut profile = self.take::<$ty>()?;
                inject(&mut profile.processor, &processor);
                inject(&mut profile.metadata, &metadata);
                Arc::new(profile)
            }};
        }
        let web_sso_profile = profile!(WebSsoProfile);
        let web_sso_profile_ecp = profile!(WebSsoProfileEcp);
        let web_sso_profile_hok = profile!(WebSsoProfileHok);
        let single_logout_profile = profile!(SingleLogoutProfile);

        let LogoutHandling {
            logout: mut logout_filter,
            processing: mut logout_processing,
            ..
        } = self.take::<LogoutHandling>()?;
        inject(&mut logout_filter.profile, &single_logout_profile);
        inject(&mut logout_filter.context, &context);
        inject(&mut logout_processing.profile, &single_logout_profile);
        inject(&mut logout_processing.processor, &processor);
        inject(&mut logout_processing.context, &context);

        let SsoHandling {
            mut entry_point,
            mut processing,
            mut hok_processing,
            mut discovery,
            ..
        } = self.take::<SsoHandling>()?;
        inject(&mut entry_point.web_sso_profile, &web_sso_profile);
        inject(&mut entry_point.ecp_profile, &web_sso_profile_ecp);
        inject(&mut entry_point.hok_profile, &web_sso_profile_hok);
        inject(&mut entry_point.metadata, &metadata);
        inject(&mut entry_point.context, &context);
        for filter in std::iter::once(&mut processing).chain(hok_processing.as_mut()) {
            inject(&mut filter.authentication_provider, &authentication_provider);
            inject(&mut filter.context, &context);
            inject(&mut filter.processor, &processor);
        }
        if let Some(discovery) = discovery.as_mut() {
            inject(&mut discovery.metadata, &metadata);
            inject(&mut discovery.context, &context);
        }

        inject(&mut generator.key_manager, &key_manager);
        inject(&mut generator.metadata, &metadata);
        let generator = Arc::new(generator);

        let generator_filter = Arc::new(MetadataGeneratorFilter {
            generator: Arc::clone(&generator),
            metadata: Some(Arc::clone(&metadata)),
        });
        let display_filter = Arc::new(MetadataDisplayFilter {
            url: generator.metadata_matcher()?,
            metadata: Some(Arc::clone(&metadata)),
            key_manager: Some(Arc::clone(&key_manager)),
            context: Some(Arc::clone(&context)),
        });

        let logout_filter = Arc::new(logout_filter);
        let logout_processing = Arc::new(logout_processing);
        let entry_point = Arc::new(entry_point);
        let processing = Arc::new(processing);
        let hok_processing = hok_processing.map(Arc::new);
        let discovery = discovery.map(Arc::new);

        let mut stages: Vec<&dyn Component> = Vec::new();
        stages.push(&*key_manager);
        stages.push(&*tls);
        stages.push(&*remote);
        stages.push(&*local);
        stages.push(&*metadata);
        stages.push(&*authentication_provider);
        stages.push(&*context);
        stages.push(&*processor);
        stages.push(&*consumer);
        stages.push(&*hok_consumer);
        stages.push(&*web_sso_profile);
        stages.push(&*web_sso_profile_ecp);
        stages.push(&*web_sso_profile_hok);
        stages.push(&*single_logout_profile);
        stages.push(&*logout_filter);
        stages.push(&*logout_processing);
        stages.push(&*entry_point);
        stages.push(&*processing);
        if let Some(hok) = &hok_processing {
            stages.push(&**hok);
        }
        if let Some(discovery) = &discovery {
            stages.push(&**discovery);
        }
        stages.push(&*generator);
        stages.push(&*generator_filter);
        stages.push(&*display_filter);

        let mut init_order = Vec::with_capacity(stages.len());
        for component in stages {
            component.finish_init()?;
            debug_fmt!("Assembler", "Initialized {}", component.component_name());
            init_order.push(component.component_name());
        }

        let mut filters: Vec<Arc<dyn SecurityFilter>> = Vec::new();
        filters.push(logout_filter);
        filters.push(logout_processing);
        filters.push(Arc::clone(&entry_point) as Arc<dyn SecurityFilter>);
        filters.push(processing);
        if let Some(hok) = hok_processing {
            filters.push(hok);
        }
        if let Some(discovery) = discovery {
            filters.push(discovery);
        }
        filters.push(generator_filter);
        filters.push(display_filter);

        let mut chain = SecurityFilterChain::baseline();
        let mut anchor = ANCHOR_FILTER;
        for filter in filters {
            let name = filter.name();
            chain.add_after(anchor, filter)?;
            anchor = name;
        }

        let key_fingerprints = key_manager
            .fingerprints()
            .map_err(|e| BuildError::key("KeyManager", e))?;

        write_registry(&self.endpoints, "Assembler")?.seal();
        if !self.store.is_empty() {
            debug_fmt!("Assembler", "Unclaimed artifacts: {:?}", self.store.type_names());
        }

        info_fmt!(
            "Assembler",
            "Pipeline {} assembled with {} filters",
            build.build_id,
            chain.len()
        );

        Ok(Pipeline {
            build_id: build.build_id,
            built_at: Utc::now(),
            chain,
            entry_point,
            access_rules: vec![AccessRule::PermitAll(self.matcher.clone()), AccessRule::Authenticated],
            matcher: self.matcher,
            components: Components {
                key_manager,
                tls,
                remote_extended_metadata: remote,
                local_extended_metadata: local,
                metadata,
                authentication_provider,
                context,
                processor,
                web_sso_consumer: consumer,
                web_sso_hok_consumer: hok_consumer,
                web_sso_profile,
                web_sso_profile_ecp,
                web_sso_profile_hok,
                single_logout_profile,
                metadata_generator: generator,
            },
            endpoints: self.endpoints,
            configurer_order,
            init_order,
            key_fingerprints,
        })
    }
}
