// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SAML request filters and the SSO/logout handling artifacts that carry them.

use std::sync::Arc;

use super::keys::KeyManager;
use super::metadata::{MetadataGenerator, MetadataManager};
use super::profiles::{
    AuthenticationProvider, ProfileOptions, SamlContextProvider, SamlProcessor, SingleLogoutProfile,
    WebSsoProfile, WebSsoProfileEcp, WebSsoProfileHok,
};
use super::{Component, require};
use crate::endpoints::AntPathMatcher;
use crate::error::BuildError;

/// A filter of the security chain.
pub trait SecurityFilter: Component {
    /// Name of the filter inside the chain.
    fn name(&self) -> &'static str;

    /// URL handled by this filter; `None` means it sees every request.
    fn processing_url(&self) -> Option<&AntPathMatcher>;

    fn processes(&self, path: &str) -> bool {
        self.processing_url().is_none_or(|url| url.matches(path))
    }
}

/// Where to go after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessHandler {
    pub default_target_url: String,
    pub always_use_default_target_url: bool,
}

impl SuccessHandler {
    /// Target for a login that started at `saved_request` (if any).
    pub fn target<'a>(&'a self, saved_request: Option<&'a str>) -> &'a str {
        match saved_request {
            Some(saved) if !self.always_use_default_target_url => saved,
            _ => &self.default_target_url,
        }
    }
}

/// Where to go after a failed login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureHandler {
    pub default_failure_url: String,
}

/// Starts SSO: redirects to discovery or sends an AuthnRequest.
#[derive(Debug, Clone)]
pub struct SamlEntryPoint {
    pub login_url: AntPathMatcher,
    pub profile_options: ProfileOptions,
    /// Set when IdP discovery is enabled.
    pub discovery_url: Option<String>,
    pub web_sso_profile: Option<Arc<WebSsoProfile>>,
    pub ecp_profile: Option<Arc<WebSsoProfileEcp>>,
    pub hok_profile: Option<Arc<WebSsoProfileHok>>,
    pub metadata: Option<Arc<MetadataManager>>,
    pub context: Option<Arc<SamlContextProvider>>,
}

impl SamlEntryPoint {
    pub fn new(login_url: AntPathMatcher, profile_options: ProfileOptions) -> Self {
        Self {
            login_url,
            profile_options,
            discovery_url: None,
            web_sso_profile: None,
            ecp_profile: None,
            hok_profile: None,
            metadata: None,
            context: None,
        }
    }

    /// Redirect for an unauthenticated request. Without an explicit IdP the
    /// user is sent to discovery when it is enabled.
    pub fn commence_url(&self, idp: Option<&str>) -> String {
        match (idp, &self.discovery_url) {
            (None, Some(discovery)) => discovery.clone(),
            (Some(idp), _) => format!("{}?idp={}", self.login_url.pattern(), urlencoding::encode(idp)),
            (None, None) => self.login_url.pattern().to_string(),
        }
    }
}

impl Component for SamlEntryPoint {
    fn component_name(&self) -> &'static str {
        "SamlEntryPoint"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "web_sso_profile", &self.web_sso_profile)?;
        require(name, "metadata", &self.metadata)?;
        require(name, "context", &self.context)
    }
}

impl SecurityFilter for SamlEntryPoint {
    fn name(&self) -> &'static str {
        "saml-entry-point"
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        Some(&self.login_url)
    }
}

/// Consumes SAML responses at the SSO (or HoK SSO) endpoint.
#[derive(Debug, Clone)]
pub struct SamlProcessingFilter {
    pub url: AntPathMatcher,
    pub holder_of_key: bool,
    pub success: SuccessHandler,
    pub failure: FailureHandler,
    pub authentication_provider: Option<Arc<AuthenticationProvider>>,
    pub context: Option<Arc<SamlContextProvider>>,
    pub processor: Option<Arc<SamlProcessor>>,
}

impl SamlProcessingFilter {
    pub fn new(url: AntPathMatcher, holder_of_key: bool, success: SuccessHandler, failure: FailureHandler) -> Self {
        Self {
            url,
            holder_of_key,
            success,
            failure,
            authentication_provider: None,
            context: None,
            processor: None,
        }
    }
}

impl Component for SamlProcessingFilter {
    fn component_name(&self) -> &'static str {
        if self.holder_of_key {
            "SamlHokProcessingFilter"
        } else {
            "SamlProcessingFilter"
        }
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "authentication_provider", &self.authentication_provider)?;
        require(name, "context", &self.context)?;
        require(name, "processor", &self.processor)
    }
}

impl SecurityFilter for SamlProcessingFilter {
    fn name(&self) -> &'static str {
        if self.holder_of_key {
            "saml-hok-processing"
        } else {
            "saml-processing"
        }
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        Some(&self.url)
    }
}

/// IdP discovery: sends the user to the selection page and back.
#[derive(Debug, Clone)]
pub struct SamlDiscovery {
    pub url: AntPathMatcher,
    pub idp_selection_path: String,
    pub metadata: Option<Arc<MetadataManager>>,
    pub context: Option<Arc<SamlContextProvider>>,
}

impl SamlDiscovery {
    pub fn new(url: AntPathMatcher, idp_selection_path: impl Into<String>) -> Self {
        Self {
            url,
            idp_selection_path: idp_selection_path.into(),
            metadata: None,
            context: None,
        }
    }

    /// Selection page URL for the SP `entity_id`, returning to `return_url`.
    pub fn selection_url(&self, entity_id: &str, return_url: &str) -> String {
        format!(
            "{}?entityID={}&returnIDParam=idp&return={}",
            self.idp_selection_path,
            urlencoding::encode(entity_id),
            urlencoding::encode(return_url)
        )
    }
}

impl Component for SamlDiscovery {
    fn component_name(&self) -> &'static str {
        "SamlDiscovery"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "metadata", &self.metadata)?;
        require(name, "context", &self.context)
    }
}

impl SecurityFilter for SamlDiscovery {
    fn name(&self) -> &'static str {
        "saml-discovery"
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        Some(&self.url)
    }
}

/// Everything the SSO facet contributes to the pipeline.
#[derive(Debug, Clone)]
pub struct SsoHandling {
    pub entry_point: SamlEntryPoint,
    pub processing: SamlProcessingFilter,
    pub hok_processing: Option<SamlProcessingFilter>,
    pub discovery: Option<SamlDiscovery>,
    pub idp_selection_page_url: Option<String>,
}

/// Local logout, optionally propagated as a global (single) logout.
#[derive(Debug, Clone)]
pub struct SamlLogoutFilter {
    pub url: AntPathMatcher,
    pub success_target_url: String,
    pub clear_authentication: bool,
    pub invalidate_session: bool,
    pub profile: Option<Arc<SingleLogoutProfile>>,
    pub context: Option<Arc<SamlContextProvider>>,
}

impl Component for SamlLogoutFilter {
    fn component_name(&self) -> &'static str {
        "SamlLogoutFilter"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "profile", &self.profile)?;
        require(name, "context", &self.context)
    }
}

impl SecurityFilter for SamlLogoutFilter {
    fn name(&self) -> &'static str {
        "saml-logout"
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        Some(&self.url)
    }
}

/// Handles LogoutRequest/LogoutResponse messages from the IdP.
#[derive(Debug, Clone)]
pub struct SamlLogoutProcessingFilter {
    pub url: AntPathMatcher,
    pub success_target_url: String,
    pub clear_authentication: bool,
    pub invalidate_session: bool,
    pub profile: Option<Arc<SingleLogoutProfile>>,
    pub processor: Option<Arc<SamlProcessor>>,
    pub context: Option<Arc<SamlContextProvider>>,
}

impl Component for SamlLogoutProcessingFilter {
    fn component_name(&self) -> &'static str {
        "SamlLogoutProcessingFilter"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "profile", &self.profile)?;
        require(name, "processor", &self.processor)?;
        require(name, "context", &self.context)
    }
}

impl SecurityFilter for SamlLogoutProcessingFilter {
    fn name(&self) -> &'static str {
        "saml-logout-processing"
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        Some(&self.url)
    }
}

/// Everything the logout facet contributes to the pipeline.
#[derive(Debug, Clone)]
pub struct LogoutHandling {
    pub logout: SamlLogoutFilter,
    pub processing: SamlLogoutProcessingFilter,
    pub default_target_url: String,
}

/// Generates SP metadata on first request when none is registered.
#[derive(Debug, Clone)]
pub struct MetadataGeneratorFilter {
    pub generator: Arc<MetadataGenerator>,
    pub metadata: Option<Arc<MetadataManager>>,
}

impl Component for MetadataGeneratorFilter {
    fn component_name(&self) -> &'static str {
        "MetadataGeneratorFilter"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        require(self.component_name(), "metadata", &self.metadata)
    }
}

impl SecurityFilter for MetadataGeneratorFilter {
    fn name(&self) -> &'static str {
        "metadata-generator"
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        None
    }
}

/// Serves the hosted SP metadata.
#[derive(Debug, Clone)]
pub struct MetadataDisplayFilter {
    pub url: AntPathMatcher,
    pub metadata: Option<Arc<MetadataManager>>,
    pub key_manager: Option<Arc<KeyManager>>,
    pub context: Option<Arc<SamlContextProvider>>,
}

impl Component for MetadataDisplayFilter {
    fn component_name(&self) -> &'static str {
        "MetadataDisplayFilter"
    }

    fn finish_init(&self) -> Result<(), BuildError> {
        let name = self.component_name();
        require(name, "metadata", &self.metadata)?;
        require(name, "key_manager", &self.key_manager)?;
        require(name, "context", &self.context)
    }
}

impl SecurityFilter for MetadataDisplayFilter {
    fn name(&self) -> &'static str {
        "metadata-display"
    }

    fn processing_url(&self) -> Option<&AntPathMatcher> {
        Some(&self.url)
    }
}
