// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{ArtifactType, BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::config::properties::defaults;
use crate::endpoints::Endpoint;
use crate::error::BuildError;
use crate::saml::{ExtendedMetadata, KeyManager, LocalExtendedMetadata, MetadataGenerator, MetadataManager};

/// Hosted SP metadata: entity id, signing flags, formats and the metadata URL.
#[derive(Debug, Default)]
pub struct MetadataGeneratorConfigurer {
    instance: Option<MetadataGenerator>,
    entity_id: Option<String>,
    entity_base_url: Option<String>,
    request_signed: Option<bool>,
    want_assertion_signed: Option<bool>,
    name_ids: Option<Vec<String>>,
    bindings_sso: Option<Vec<String>>,
    metadata_url: Option<String>,
}

impl MetadataGeneratorConfigurer {
    const SECTION: &'static str = "metadata_generator";

    pub fn metadata_generator(&mut self, generator: MetadataGenerator) -> &mut Self {
        self.instance = Some(generator);
        self
    }

    dsl_setters! {
        entity_id: String,
        entity_base_url: String,
        request_signed: bool,
        want_assertion_signed: bool,
        name_ids: Vec<String>,
        bindings_sso: Vec<String>,
        metadata_url: String,
    }
}

#[async_trait]
impl Facet for MetadataGeneratorConfigurer {
    type Artifact = MetadataGenerator;

    const NAME: &'static str = "MetadataGenerator";
    const STAGE: u32 = stage::METADATA_GENERATOR;

    fn requires() -> Vec<ArtifactType> {
        vec![
            ArtifactType::of::<KeyManager>(),
            ArtifactType::of::<LocalExtendedMetadata>(),
            ArtifactType::of::<MetadataManager>(),
        ]
    }

    fn take_instance(&mut self) -> Option<MetadataGenerator> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<MetadataGenerator, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        let entity_id: String = r.required(self.entity_id.clone(), "entity_id")?;
        let metadata_url = r.or_default(self.metadata_url.clone(), "metadata_url", || {
            defaults::METADATA_URL.to_string()
        })?;

        let mut generator = MetadataGenerator::new(entity_id, metadata_url);
        generator.entity_base_url = r.optional(self.entity_base_url.clone(), "entity_base_url")?;
        generator.request_signed = r.or_default(self.request_signed, "request_signed", || true)?;
        generator.want_assertion_signed =
            r.or_default(self.want_assertion_signed, "want_assertion_signed", || true)?;
        generator.name_ids = r.or_default(self.name_ids.clone(), "name_ids", MetadataGenerator::default_name_ids)?;
        generator.bindings_sso = r.or_default(
            self.bindings_sso.clone(),
            "bindings_sso",
            MetadataGenerator::default_bindings_sso,
        )?;
        generator.extended_metadata = ctx
            .store
            .get::<LocalExtendedMetadata>()
            .map(|local| local.0.clone())
            .unwrap_or_else(ExtendedMetadata::local);

        Ok(generator)
    }

    fn endpoints(generator: &MetadataGenerator) -> Vec<(Endpoint, String)> {
        vec![(Endpoint::Metadata, generator.metadata_url.clone())]
    }
}
