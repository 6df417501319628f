// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata: extended metadata, the metadata manager and the SP metadata generator.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::keys::KeyManager;
use super::profiles::TlsConfiguration;
use super::{Component, require};
use crate::endpoints::AntPathMatcher;
use crate::error::BuildError;

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"entityID\s*=\s*"([^"]+)""#).expect("entityID pattern is valid"));

/// Per-entity settings that SAML metadata itself does not carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedMetadata {
    pub local: bool,
    pub alias: Option<String>,
    pub idp_discovery_enabled: bool,
    pub idp_discovery_url: Option<String>,
    pub idp_discovery_response_url: Option<String>,
    pub ecp_enabled: bool,
    pub security_profile: String,
    pub ssl_security_profile: String,
    pub signing_key: Option<String>,
    pub encryption_key: Option<String>,
    pub tls_key: Option<String>,
    pub sign_metadata: bool,
    pub require_logout_request_signed: bool,
    pub require_logout_response_signed: bool,
    pub support_unsolicited_response: bool,
}

impl Default for ExtendedMetadata {
    fn default() -> Self {
        Self {
            local: false,
            alias: None,
            idp_discovery_enabled: false,
            idp_discovery_url: None,
            idp_discovery_response_url: None,
            ecp_enabled: false,
            security_profile: "metaiop".to_string(),
            ssl_security_profile: "pkix".to_string(),
            signing_key: None,
            encryption_key: None,
            tls_key: None,
            sign_metadata: false,
            require_logout_request_signed: true,
            require_logout_response_signed: false,
            support_unsolicited_response: true,
        }
    }
}

impl ExtendedMetadata {
    /// Defaults for the hosted service provider.
    pub fn local() -> Self {
        Self {
            local: true,
            idp_discovery_enabled: true,
            ..Self::default()
        }
    }

    /// Key aliases this entity refers to.
    pub fn key_aliases(&self) -> impl Iterator<Item = &str> {
        [&self.signing_key, &self.encryption_key, &self.tls_key]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }
}

/// Extended metadata applied to remote (IdP) entities.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteExtendedMetadata(pub ExtendedMetadata);

/// Extended metadata of the hosted SP.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalExtendedMetadata(pub ExtendedMetadata);

impl Default for RemoteExtendedMetadata {
    fn default() -> Self {
        Self(ExtendedMetadata::default())
    }
}

impl Default for LocalExtendedMetadata {
    fn default() -> Self {
        Self(ExtendedMetadata::local())
    }
}

impl Component for RemoteExtendedMetadata {
    fn component_name(&self) -> &'static str {
        "RemoteExtendedMetadata"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        if self.0.local {
            return Err(BuildError::init(self.component_name(), "remote metadata marked as local"));
        }
        Ok(())
    }
}

impl Component for LocalExtendedMetadata {
    fn component_name(&self) -> &'static str {
        "LocalExtendedMetadata"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        if !self.0.local {
            return Err(BuildError::init(self.component_name(), "local metadata not marked as local"));
        }
        Ok(())
    }
}

/// One loaded metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataProvider {
    pub location: String,
    pub document: Bytes,
}

impl MetadataProvider {
    pub fn new(location: impl Into<String>, document: Bytes) -> Self {
        Self {
            location: location.into(),
            document,
        }
    }

    /// Entity ids declared in the document. Non UTF-8 documents declare none.
    pub fn entity_ids(&self) -> Vec<String> {
        let Ok(text) = std::str::from_utf8(&self.document) else {
            return Vec::new();
        };
        ENTITY_ID
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect()
    }
}

/// Registry of all known metadata documents.
#[derive(Debug, Clone)]
pub struct MetadataManager {
    pub providers: Vec<MetadataProvider>,
    pub default_idp: Option<String>,
    pub hosted_sp_name: Option<String>,
    pub refresh_check_interval_ms: Option<u64>,
    pub metadata_trust_check: bool,
    pub remote_extended_metadata: ExtendedMetadata,
    pub key_manager: Option<Arc<KeyManager>>,
    pub tls: Option<Arc<TlsConfiguration>>,
}

impl MetadataManager {
    pub fn new(providers: Vec<MetadataProvider>) -> Self {
        Self {
            providers,
            default_idp: None,
            hosted_sp_name: None,
            refresh_check_interval_ms: None,
            metadata_trust_check: true,
            remote_extended_metadata: ExtendedMetadata::default(),
            key_manager: None,
            tls: None,
        }
    }

    pub fn locations(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.location.as_str()).collect()
    }

    /// Entity ids across every provider, in provider order.
    pub fn entity_ids(&self) -> Vec<String> {
        self.providers.iter().flat_map(MetadataProvider::entity_ids).collect()
    }

    /// Entity ids of identity providers, i.e. everything except the hosted SP.
    pub fn idp_entity_ids(&self) -> Vec<String> {
        self.entity_ids()
            .into_iter()
            .filter(|id| Some(id) != self.hosted_sp_name.as_ref())
            .collect()
    }
}

impl Component for MetadataManager {
    fn component_name(&self) -> &'static str {
        "MetadataManager"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        if self.providers.is_empty() {
            return Err(BuildError::init(name, "no metadata providers"));
        }
        require(name, "key_manager", &self.key_manager)?;
        require(name, "tls", &self.tls)?;

        if let Some(idp) = &self.default_idp {
            let known = self.entity_ids();
            if !known.is_empty() && !known.contains(idp) {
                return Err(BuildError::init(name, format!("default IdP '{idp}' is not in any metadata document")));
            }
        }
        Ok(())
    }
}

/// Generates the hosted SP's metadata.
#[derive(Debug, Clone)]
pub struct MetadataGenerator {
    pub entity_id: String,
    pub entity_base_url: Option<String>,
    pub request_signed: bool,
    pub want_assertion_signed: bool,
    pub name_ids: Vec<String>,
    pub bindings_sso: Vec<String>,
    pub metadata_url: String,
    pub extended_metadata: ExtendedMetadata,
    pub key_manager: Option<Arc<KeyManager>>,
    pub metadata: Option<Arc<MetadataManager>>,
}

impl MetadataGenerator {
    pub fn default_name_ids() -> Vec<String> {
        [
            "urn:oasis:names:tc:SAML:2.0:nameid-format:transient",
            "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
            "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn default_bindings_sso() -> Vec<String> {
        vec!["post".to_string(), "artifact".to_string()]
    }

    pub fn new(entity_id: impl Into<String>, metadata_url: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_base_url: None,
            request_signed: true,
            want_assertion_signed: true,
            name_ids: Self::default_name_ids(),
            bindings_sso: Self::default_bindings_sso(),
            metadata_url: metadata_url.into(),
            extended_metadata: ExtendedMetadata::local(),
            key_manager: None,
            metadata: None,
        }
    }

    /// Matcher for the metadata display URL.
    pub fn metadata_matcher(&self) -> Result<AntPathMatcher, BuildError> {
        AntPathMatcher::new(&self.metadata_url)
    }

    /// Absolute URL of an SP endpoint, when the base URL is known.
    pub fn endpoint_url(&self, path: &str) -> Option<String> {
        self.entity_base_url
            .as_ref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), path))
    }
}

impl Component for MetadataGenerator {
    fn component_name(&self) -> &'static str {
        "MetadataGenerator"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        if self.entity_id.trim().is_empty() {
            return Err(BuildError::init(name, "entity id is empty"));
        }
        require(name, "key_manager", &self.key_manager)?;
        require(name, "metadata", &self.metadata)?;

        if let Some(keys) = &self.key_manager {
            if let Some(alias) = self.extended_metadata.key_aliases().find(|a| !keys.contains(a)) {
                return Err(BuildError::init(name, format!("unknown key alias '{alias}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDP_METADATA: &[u8] = include_bytes!("../../tests/fixtures/idp-metadata.xml");

    #[test]
    fn test_entity_ids_from_document() {
        let provider = MetadataProvider::new("idp.xml", Bytes::from_static(IDP_METADATA));
        assert_eq!(provider.entity_ids(), vec!["https://idp.example.com/saml"]);

        let garbage = MetadataProvider::new("bin", Bytes::from_static(&[0xff, 0xfe]));
        assert!(garbage.entity_ids().is_empty());
    }

    #[test]
    fn test_idp_entity_ids_skip_hosted_sp() {
        let sp = MetadataProvider::new(
            "sp.xml",
            Bytes::from_static(br#"<EntityDescriptor entityID="urn:sp"/>"#),
        );
        let idp = MetadataProvider::new("idp.xml", Bytes::from_static(IDP_METADATA));
        let mut manager = MetadataManager::new(vec![sp, idp]);
        manager.hosted_sp_name = Some("urn:sp".to_string());

        assert_eq!(manager.locations(), vec!["sp.xml", "idp.xml"]);
        assert_eq!(manager.idp_entity_ids(), vec!["https://idp.example.com/saml"]);
    }

    #[test]
    fn test_manager_requires_injected_references() {
        let provider = MetadataProvider::new("idp.xml", Bytes::from_static(IDP_METADATA));
        let manager = MetadataManager::new(vec![provider]);

        match manager.finish_init() {
            Err(BuildError::Initialization { component, message }) => {
                assert_eq!(component, "MetadataManager");
                assert!(message.contains("key_manager"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extended_metadata_defaults() {
        let local = LocalExtendedMetadata::default();
        assert!(local.0.local);
        assert!(local.0.idp_discovery_enabled);
        assert!(local.finish_init().is_ok());

        let remote = RemoteExtendedMetadata::default();
        assert!(!remote.0.idp_discovery_enabled);
        assert!(remote.finish_init().is_ok());
        assert!(RemoteExtendedMetadata(ExtendedMetadata::local()).finish_init().is_err());
    }

    #[test]
    fn test_generator_endpoint_url() {
        let mut generator = MetadataGenerator::new("urn:sp", "/saml/metadata");
        assert_eq!(generator.endpoint_url("/saml/SSO"), None);

        generator.entity_base_url = Some("https://sp.example.com/".to_string());
        assert_eq!(
            generator.endpoint_url("/saml/SSO").as_deref(),
            Some("https://sp.example.com/saml/SSO")
        );
    }
}
