// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport security, bindings, context and the WebSSO/SLO profiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::keys::KeyManager;
use super::metadata::MetadataManager;
use super::{Component, require};
use crate::error::BuildError;

/// How TLS peers are checked against their certificate host names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostnameVerification {
    #[default]
    Default,
    DefaultAndLocalhost,
    Strict,
    AllowAll,
}

/// TLS settings used when fetching metadata and for artifact resolution.
#[derive(Debug, Clone)]
pub struct TlsConfiguration {
    pub protocol: String,
    pub hostname_verification: HostnameVerification,
    /// Key aliases trusted for TLS; `None` trusts every key of the key manager.
    pub trusted_keys: Option<Vec<String>>,
    pub key_manager: Option<Arc<KeyManager>>,
}

impl Default for TlsConfiguration {
    fn default() -> Self {
        Self {
            protocol: "https".to_string(),
            hostname_verification: HostnameVerification::Default,
            trusted_keys: None,
            key_manager: None,
        }
    }
}

impl Component for TlsConfiguration {
    fn component_name(&self) -> &'static str {
        "TlsConfiguration"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        if self.protocol.is_empty() {
            return Err(BuildError::init(name, "empty protocol"));
        }
        require(name, "key_manager", &self.key_manager)?;

        if let (Some(keys), Some(trusted)) = (&self.key_manager, &self.trusted_keys) {
            if let Some(alias) = trusted.iter().find(|a| !keys.contains(a)) {
                return Err(BuildError::init(name, format!("trusted key '{alias}' is not in the key manager")));
            }
        }
        Ok(())
    }
}

/// SAML message bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Redirect,
    Post,
    Artifact,
    Soap,
    Paos,
}

impl Binding {
    pub const ALL: [Binding; 5] = [
        Binding::Redirect,
        Binding::Post,
        Binding::Artifact,
        Binding::Soap,
        Binding::Paos,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Binding::Redirect => "redirect",
            Binding::Post => "post",
            Binding::Artifact => "artifact",
            Binding::Soap => "soap",
            Binding::Paos => "paos",
        }
    }

    pub const fn uri(self) -> &'static str {
        match self {
            Binding::Redirect => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
            Binding::Post => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST",
            Binding::Artifact => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Artifact",
            Binding::Soap => "urn:oasis:names:tc:SAML:2.0:bindings:SOAP",
            Binding::Paos => "urn:oasis:names:tc:SAML:2.0:bindings:PAOS",
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encodes and decodes SAML messages over the enabled bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct SamlProcessor {
    pub bindings: Vec<Binding>,
}

impl Default for SamlProcessor {
    fn default() -> Self {
        Self {
            bindings: Binding::ALL.to_vec(),
        }
    }
}

impl SamlProcessor {
    pub fn supports(&self, binding: Binding) -> bool {
        self.bindings.contains(&binding)
    }
}

impl Component for SamlProcessor {
    fn component_name(&self) -> &'static str {
        "SamlProcessor"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        if self.bindings.is_empty() {
            return Err(BuildError::init(self.component_name(), "no bindings enabled"));
        }
        Ok(())
    }
}

/// Public address of the SP when it runs behind a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerSettings {
    pub scheme: String,
    pub server_name: String,
    pub server_port: u16,
    pub include_server_port_in_request_url: bool,
    pub context_path: String,
}

impl Default for LoadBalancerSettings {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            server_name: "localhost".to_string(),
            server_port: 8080,
            include_server_port_in_request_url: false,
            context_path: "/".to_string(),
        }
    }
}

impl LoadBalancerSettings {
    /// Externally visible base URL, without a trailing slash.
    pub fn base_url(&self) -> String {
        let mut url = format!("{}://{}", self.scheme, self.server_name);
        if self.include_server_port_in_request_url {
            url.push_str(&format!(":{}", self.server_port));
        }
        url.push_str(self.context_path.trim_end_matches('/'));
        url
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextProviderKind {
    Default,
    LoadBalanced(LoadBalancerSettings),
}

/// Populates the per-message SAML context (local entity, peer, credentials).
#[derive(Debug, Clone)]
pub struct SamlContextProvider {
    pub kind: ContextProviderKind,
    pub key_manager: Option<Arc<KeyManager>>,
    pub metadata: Option<Arc<MetadataManager>>,
}

impl SamlContextProvider {
    pub fn new(kind: ContextProviderKind) -> Self {
        Self {
            kind,
            key_manager: None,
            metadata: None,
        }
    }

    pub fn is_load_balanced(&self) -> bool {
        matches!(self.kind, ContextProviderKind::LoadBalanced(_))
    }
}

impl Default for SamlContextProvider {
    fn default() -> Self {
        Self::new(ContextProviderKind::Default)
    }
}

impl Component for SamlContextProvider {
    fn component_name(&self) -> &'static str {
        "SamlContextProvider"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "key_manager", &self.key_manager)?;
        require(name, "metadata", &self.metadata)?;

        if let ContextProviderKind::LoadBalanced(lb) = &self.kind {
            if lb.scheme != "http" && lb.scheme != "https" {
                return Err(BuildError::init(name, format!("unsupported scheme '{}'", lb.scheme)));
            }
            if !lb.context_path.starts_with('/') {
                return Err(BuildError::init(name, "context path must start with '/'"));
            }
        }
        Ok(())
    }
}

/// Validation limits applied when consuming assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerSettings {
    pub max_authentication_age: u64,
    pub max_assertion_time: u64,
    pub response_skew: u64,
    pub release_dom: bool,
    pub include_all_attributes: bool,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            max_authentication_age: 7200,
            max_assertion_time: 3000,
            response_skew: crate::config::properties::defaults::RESPONSE_SKEW,
            release_dom: true,
            include_all_attributes: false,
        }
    }
}

/// Type markers for the profile and consumer families.
pub mod kind {
    #[derive(Debug, Clone, Copy)]
    pub struct WebSso;
    #[derive(Debug, Clone, Copy)]
    pub struct Ecp;
    #[derive(Debug, Clone, Copy)]
    pub struct HolderOfKey;
    #[derive(Debug, Clone, Copy)]
    pub struct SingleLogout;
}

/// Consumes authentication responses.
#[derive(Debug, Clone)]
pub struct Consumer<K> {
    pub settings: ConsumerSettings,
    pub processor: Option<Arc<SamlProcessor>>,
    pub metadata: Option<Arc<MetadataManager>>,
    kind: PhantomData<fn() -> K>,
}

pub type WebSsoProfileConsumer = Consumer<kind::WebSso>;
pub type WebSsoProfileHokConsumer = Consumer<kind::HolderOfKey>;

impl<K> Consumer<K> {
    pub fn new(settings: ConsumerSettings) -> Self {
        Self {
            settings,
            processor: None,
            metadata: None,
            kind: PhantomData,
        }
    }

    fn check(&self, name: &'static str) -> Result<(), BuildError> {
        require(name, "processor", &self.processor)?;
        require(name, "metadata", &self.metadata)
    }
}

impl<K> Default for Consumer<K> {
    fn default() -> Self {
        Self::new(ConsumerSettings::default())
    }
}

impl Component for WebSsoProfileConsumer {
    fn component_name(&self) -> &'static str {
        "WebSsoProfileConsumer"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        self.check(self.component_name())
    }
}

impl Component for WebSsoProfileHokConsumer {
    fn component_name(&self) -> &'static str {
        "WebSsoProfileHokConsumer"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        self.check(self.component_name())
    }
}

/// Sends requests for one profile (WebSSO, ECP, HoK or single logout).
#[derive(Debug, Clone)]
pub struct Profile<K> {
    pub response_skew: u64,
    pub processor: Option<Arc<SamlProcessor>>,
    pub metadata: Option<Arc<MetadataManager>>,
    kind: PhantomData<fn() -> K>,
}

pub type WebSsoProfile = Profile<kind::WebSso>;
pub type WebSsoProfileEcp = Profile<kind::Ecp>;
pub type WebSsoProfileHok = Profile<kind::HolderOfKey>;
pub type SingleLogoutProfile = Profile<kind::SingleLogout>;

impl<K> Profile<K> {
    pub fn new(response_skew: u64) -> Self {
        Self {
            response_skew,
            processor: None,
            metadata: None,
            kind: PhantomData,
        }
    }

    fn check(&self, name: &'static str) -> Result<(), BuildError> {
        require(name, "processor", &self.processor)?;
        require(name, "metadata", &self.metadata)
    }
}

impl<K> Default for Profile<K> {
    fn default() -> Self {
        Self::new(crate::config::properties::defaults::RESPONSE_SKEW)
    }
}

macro_rules! profile_component {
    ($ty:ty, $name:literal) => {
        impl Component for $ty {
            fn component_name(&self) -> &'static str {
                $name
            }

            fn finish_init(&self) -> Result<(), BuildError> {
                self.check(self.component_name())
            }
        }
    };
}

profile_component!(WebSsoProfile, "WebSsoProfile");
profile_component!(WebSsoProfileEcp, "WebSsoProfileEcp");
profile_component!(WebSsoProfileHok, "WebSsoProfileHok");
profile_component!(SingleLogoutProfile, "SingleLogoutProfile");

/// Options of the AuthnRequest sent by the entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    pub binding: Option<Binding>,
    pub include_scoping: bool,
    pub allow_create: bool,
    pub passive: bool,
    pub force_authn: bool,
    pub name_id: Option<String>,
    pub relay_state: Option<String>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            binding: None,
            include_scoping: true,
            allow_create: false,
            passive: false,
            force_authn: false,
            name_id: None,
            relay_state: None,
        }
    }
}

/// Turns consumed assertions into authenticated principals.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationProvider {
    pub exclude_credential: bool,
    pub force_principal_as_string: bool,
    pub consumer: Option<Arc<WebSsoProfileConsumer>>,
    pub hok_consumer: Option<Arc<WebSsoProfileHokConsumer>>,
}

impl Component for AuthenticationProvider {
    fn component_name(&self) -> &'static str {
        "AuthenticationProvider"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        require(self.component_name(), "consumer", &self.consumer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_balancer_base_url() {
        let mut lb = LoadBalancerSettings::default();
        assert_eq!(lb.base_url(), "http://localhost");

        lb.scheme = "https".to_string();
        lb.server_name = "sp.example.com".to_string();
        lb.server_port = 8443;
        lb.include_server_port_in_request_url = true;
        lb.context_path = "/app/".to_string();
        assert_eq!(lb.base_url(), "https://sp.example.com:8443/app");
    }

    #[test]
    fn test_profile_options_deserialize_with_defaults() {
        let options: ProfileOptions =
            serde_json::from_value(serde_json::json!({ "binding": "post", "passive": true })).unwrap();

        assert_eq!(options.binding, Some(Binding::Post));
        assert!(options.passive);
        assert!(options.include_scoping);
        assert!(!options.force_authn);
    }

    #[test]
    fn test_unwired_profiles_fail_init() {
        let err = WebSsoProfileEcp::default().finish_init().unwrap_err();
        assert!(matches!(err, BuildError::Initialization { component: "WebSsoProfileEcp", .. }));

        let mut consumer = WebSsoProfileConsumer::default();
        consumer.processor = Some(Arc::new(SamlProcessor::default()));
        let err = consumer.finish_init().unwrap_err();
        assert!(err.to_string().contains("metadata"));
    }

    #[test]
    fn test_processor_requires_a_binding() {
        assert!(SamlProcessor::default().finish_init().is_ok());
        assert!(SamlProcessor { bindings: vec![] }.finish_init().is_err());
        assert!(SamlProcessor::default().supports(Binding::Paos));
    }

    #[test]
    fn test_hostname_verification_names() {
        let mode: HostnameVerification = serde_json::from_str("\"default_and_localhost\"").unwrap();
        assert_eq!(mode, HostnameVerification::DefaultAndLocalhost);
    }
}
