// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::chain::SecurityFilterChain;
use crate::endpoints::{Endpoint, LazyRequestMatcher, SharedEndpoints, read_registry};
use crate::saml::{
    AuthenticationProvider, KeyManager, LocalExtendedMetadata, MetadataGenerator, MetadataManager,
    RemoteExtendedMetadata, SamlContextProvider, SamlEntryPoint, SamlProcessor, SecurityFilter, SingleLogoutProfile,
    TlsConfiguration, WebSsoProfile, WebSsoProfileConsumer, WebSsoProfileEcp, WebSsoProfileHok,
    WebSsoProfileHokConsumer,
};

/// Outcome of the access rules for one request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Permit,
    Authenticate,
}

/// One access rule; the first rule that decides wins.
#[derive(Debug, Clone)]
pub enum AccessRule {
    /// Paths matched by the SAML endpoint matcher need no authentication.
    PermitAll(LazyRequestMatcher),
    /// Every request reaching this rule must be authenticated.
    Authenticated,
}

impl AccessRule {
    fn decide(&self, path: &str) -> Option<Access> {
        match self {
            AccessRule::PermitAll(matcher) => matcher.matches(path).then_some(Access::Permit),
            AccessRule::Authenticated => Some(Access::Authenticate),
        }
    }
}

/// The fully wired SAML components of a pipeline.
#[derive(Debug, Clone)]
pub struct Components {
    pub key_manager: Arc<KeyManager>,
    pub tls: Arc<TlsConfiguration>,
    pub remote_extended_metadata: Arc<RemoteExtendedMetadata>,
    pub local_extended_metadata: Arc<LocalExtendedMetadata>,
    pub metadata: Arc<MetadataManager>,
    pub authentication_provider: Arc<AuthenticationProvider>,
    pub context: Arc<SamlContextProvider>,
    pub processor: Arc<SamlProcessor>,
    pub web_sso_consumer: Arc<WebSsoProfileConsumer>,
    pub web_sso_hok_consumer: Arc<WebSsoProfileHokConsumer>,
    pub web_sso_profile: Arc<WebSsoProfile>,
    pub web_sso_profile_ecp: Arc<WebSsoProfileEcp>,
    pub web_sso_profile_hok: Arc<WebSsoProfileHok>,
    pub single_logout_profile: Arc<SingleLogoutProfile>,
    pub metadata_generator: Arc<MetadataGenerator>,
}

/// Structural view of a pipeline, stable across builds of the same input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDescription {
    pub entity_id: String,
    pub filters: Vec<String>,
    pub public_patterns: Vec<String>,
    pub endpoints: BTreeMap<Endpoint, String>,
    pub entry_point_url: String,
    pub metadata_locations: Vec<String>,
    pub configurer_order: Vec<String>,
    pub init_order: Vec<String>,
    pub key_fingerprints: BTreeMap<String, String>,
}

/// The assembled SAML service provider pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) build_id: Uuid,
    pub(crate) built_at: DateTime<Utc>,
    pub(crate) chain: SecurityFilterChain,
    pub(crate) entry_point: Arc<SamlEntryPoint>,
    pub(crate) matcher: LazyRequestMatcher,
    pub(crate) access_rules: Vec<AccessRule>,
    pub(crate) components: Components,
    pub(crate) endpoints: SharedEndpoints,
    pub(crate) configurer_order: Vec<&'static str>,
    pub(crate) init_order: Vec<&'static str>,
    pub(crate) key_fingerprints: BTreeMap<String, String>,
}

impl Pipeline {
    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn chain(&self) -> &SecurityFilterChain {
        &self.chain
    }

    /// The entry point that starts authentication for protected requests.
    pub fn entry_point(&self) -> &Arc<SamlEntryPoint> {
        &self.entry_point
    }

    /// Matcher over the public SAML endpoints.
    pub fn matcher(&self) -> &LazyRequestMatcher {
        &self.matcher
    }

    pub fn access_rules(&self) -> &[AccessRule] {
        &self.access_rules
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Configurer units in the order they ran.
    pub fn configurer_order(&self) -> &[&'static str] {
        &self.configurer_order
    }

    /// Components in the order their initialization hooks ran.
    pub fn init_order(&self) -> &[&'static str] {
        &self.init_order
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> Option<String> {
        read_registry(&self.endpoints)
            .get(endpoint)
            .map(str::to_string)
    }

    pub fn authorize(&self, path: &str) -> Access {
        self.access_rules
            .iter()
            .find_map(|rule| rule.decide(path))
            .unwrap_or(Access::Authenticate)
    }

    /// SAML filter that handles `path`, if any.
    pub fn filter_for(&self, path: &str) -> Option<&Arc<dyn SecurityFilter>> {
        self.chain.filter_for(path)
    }

    pub fn describe(&self) -> PipelineDescription {
        let endpoints = read_registry(&self.endpoints)
            .entries()
            .into_iter()
            .map(|(endpoint, pattern)| (endpoint, pattern.to_string()))
            .collect();

        PipelineDescription {
            entity_id: self.components.metadata_generator.entity_id.clone(),
            filters: self.chain.names().into_iter().map(str::to_string).collect(),
            public_patterns: self.matcher.patterns(),
            endpoints,
            entry_point_url: self.entry_point.login_url.pattern().to_string(),
            metadata_locations: self
                .components
                .metadata
                .locations()
                .into_iter()
                .map(str::to_string)
                .collect(),
            configurer_order: self.configurer_order.iter().map(|s| s.to_string()).collect(),
            init_order: self.init_order.iter().map(|s| s.to_string()).collect(),
            key_fingerprints: self.key_fingerprints.clone(),
        }
    }
}
