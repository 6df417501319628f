// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{ArtifactType, BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::error::BuildError;
use crate::saml::{
    ExtendedMetadata, KeyManager, MetadataManager, MetadataProvider, RemoteExtendedMetadata, TlsConfiguration,
};
use crate::{debug_fmt, info_fmt};

/// Metadata documents of the identity providers (and optionally the SP).
#[derive(Debug, Default)]
pub struct MetadataManagerConfigurer {
    instance: Option<MetadataManager>,
    metadata_locations: Option<Vec<String>>,
    default_idp: Option<String>,
    hosted_sp_name: Option<String>,
    refresh_check_interval_ms: Option<u64>,
    metadata_trust_check: Option<bool>,
}

impl MetadataManagerConfigurer {
    const SECTION: &'static str = "metadata_manager";

    pub fn metadata_manager(&mut self, manager: MetadataManager) -> &mut Self {
        self.instance = Some(manager);
        self
    }

    /// Add one metadata location (file path, `classpath:` or `http(s)://`).
    pub fn metadata_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.metadata_locations
            .get_or_insert_with(Vec::new)
            .push(location.into());
        self
    }

    dsl_setters! {
        metadata_locations: Vec<String>,
        default_idp: String,
        hosted_sp_name: String,
        refresh_check_interval_ms: u64,
        metadata_trust_check: bool,
    }
}

#[async_trait]
impl Facet for MetadataManagerConfigurer {
    type Artifact = MetadataManager;

    const NAME: &'static str = "MetadataManager";
    const STAGE: u32 = stage::METADATA_MANAGER;

    fn requires() -> Vec<ArtifactType> {
        vec![
            ArtifactType::of::<KeyManager>(),
            ArtifactType::of::<TlsConfiguration>(),
            ArtifactType::of::<RemoteExtendedMetadata>(),
        ]
    }

    fn take_instance(&mut self) -> Option<MetadataManager> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<MetadataManager, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        let locations: Vec<String> = r.required(self.metadata_locations.clone(), "metadata_locations")?;
        if locations.is_empty() {
            return Err(BuildError::missing(Self::NAME, "metadata_locations"));
        }

        let mut providers = Vec::with_capacity(locations.len());
        for location in &locations {
            let resource = ctx.resources.load(location).await?;
            let provider = MetadataProvider::new(resource.location, resource.content);
            debug_fmt!(Self::NAME, "Loaded {} declaring {:?}", location, provider.entity_ids());
            providers.push(provider);
        }

        let mut manager = MetadataManager::new(providers);
        manager.default_idp = r.optional(self.default_idp.clone(), "default_idp")?;
        manager.hosted_sp_name = r.optional(self.hosted_sp_name.clone(), "hosted_sp_name")?;
        manager.refresh_check_interval_ms =
            r.optional(self.refresh_check_interval_ms, "refresh_check_interval_ms")?;
        manager.metadata_trust_check =
            r.or_default(self.metadata_trust_check, "metadata_trust_check", || true)?;
        manager.remote_extended_metadata = ctx
            .store
            .get::<RemoteExtendedMetadata>()
            .map(|remote| remote.0.clone())
            .unwrap_or_else(ExtendedMetadata::default);

        info_fmt!(Self::NAME, "{} metadata provider(s) registered", manager.providers.len());
        Ok(manager)
    }
}
