// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{ArtifactType, BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::config::properties::defaults;
use crate::endpoints::{AntPathMatcher, Endpoint};
use crate::error::BuildError;
use crate::saml::{
    AuthenticationProvider, FailureHandler, LocalExtendedMetadata, ProfileOptions, SamlDiscovery, SamlEntryPoint,
    SamlProcessingFilter, SsoHandling, SuccessHandler, WebSsoProfile,
};
use crate::debug_fmt;

/// Entry point, SSO and HoK SSO processing, and IdP discovery.
#[derive(Debug, Default)]
pub struct SsoConfigurer {
    instance: Option<SsoHandling>,
    sso_processing_url: Option<String>,
    sso_hok_processing_url: Option<String>,
    discovery_processing_url: Option<String>,
    idp_selection_page_url: Option<String>,
    sso_login_url: Option<String>,
    default_success_url: Option<String>,
    default_failure_url: Option<String>,
    always_use_default_success_url: Option<bool>,
    enable_sso_hok: Option<bool>,
    enable_discovery: Option<bool>,
    profile_options: Option<ProfileOptions>,
}

impl SsoConfigurer {
    const SECTION: &'static str = "sso";

    pub fn sso_handling(&mut self, handling: SsoHandling) -> &mut Self {
        self.instance = Some(handling);
        self
    }

    dsl_setters! {
        sso_processing_url: String,
        sso_hok_processing_url: String,
        discovery_processing_url: String,
        idp_selection_page_url: String,
        sso_login_url: String,
        default_success_url: String,
        default_failure_url: String,
        always_use_default_success_url: bool,
        /// Holder-of-key SSO processing; on by default.
        enable_sso_hok: bool,
        /// IdP discovery; defaults to the local extended metadata setting.
        enable_discovery: bool,
        profile_options: ProfileOptions,
    }
}

#[async_trait]
impl Facet for SsoConfigurer {
    type Artifact = SsoHandling;

    const NAME: &'static str = "Sso";
    const STAGE: u32 = stage::SSO;

    fn requires() -> Vec<ArtifactType> {
        vec![
            ArtifactType::of::<LocalExtendedMetadata>(),
            ArtifactType::of::<AuthenticationProvider>(),
            ArtifactType::of::<WebSsoProfile>(),
        ]
    }

    fn take_instance(&mut self) -> Option<SsoHandling> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<SsoHandling, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);
        let url = |dsl: &Option<String>, field: &str, default: &str| {
            r.or_default(dsl.clone(), field, || default.to_string())
        };

        let success = SuccessHandler {
            default_target_url: url(&self.default_success_url, "default_success_url", defaults::DEFAULT_SUCCESS_URL)?,
            always_use_default_target_url: r.or_default(
                self.always_use_default_success_url,
                "always_use_default_success_url",
                || false,
            )?,
        };
        let failure = FailureHandler {
            default_failure_url: url(&self.default_failure_url, "default_failure_url", defaults::DEFAULT_FAILURE_URL)?,
        };

        let processing_url = url(&self.sso_processing_url, "sso_processing_url", defaults::SSO_PROCESSING_URL)?;
        let processing = SamlProcessingFilter::new(
            AntPathMatcher::new(&processing_url)?,
            false,
            success.clone(),
            failure.clone(),
        );

        let hok_processing = if r.or_default(self.enable_sso_hok, "enable_sso_hok", || true)? {
            let hok_url = url(
                &self.sso_hok_processing_url,
                "sso_hok_processing_url",
                defaults::SSO_HOK_PROCESSING_URL,
            )?;
            Some(SamlProcessingFilter::new(AntPathMatcher::new(&hok_url)?, true, success, failure))
        } else {
            debug_fmt!(Self::NAME, "Holder-of-key SSO disabled");
            None
        };

        let profile_options = r.or_default(self.profile_options.clone(), "profile_options", ProfileOptions::default)?;
        let login_url = url(&self.sso_login_url, "sso_login_url", defaults::SSO_LOGIN_URL)?;
        let mut entry_point = SamlEntryPoint::new(AntPathMatcher::new(&login_url)?, profile_options);

        let discovery_default = ctx
            .store
            .get::<LocalExtendedMetadata>()
            .is_none_or(|local| local.0.idp_discovery_enabled);
        let (discovery, idp_selection_page_url) =
            if r.or_default(self.enable_discovery, "enable_discovery", || discovery_default)? {
                let discovery_url = url(
                    &self.discovery_processing_url,
                    "discovery_processing_url",
                    defaults::DISCOVERY_PROCESSING_URL,
                )?;
                let selection = url(
                    &self.idp_selection_page_url,
                    "idp_selection_page_url",
                    defaults::IDP_SELECTION_PAGE_URL,
                )?;
                entry_point.discovery_url = Some(discovery_url.clone());
                (
                    Some(SamlDiscovery::new(AntPathMatcher::new(&discovery_url)?, selection.clone())),
                    Some(selection),
                )
            } else {
                debug_fmt!(Self::NAME, "IdP discovery disabled");
                (None, None)
            };

        Ok(SsoHandling {
            entry_point,
            processing,
            hok_processing,
            discovery,
            idp_selection_page_url,
        })
    }

    fn endpoints(handling: &SsoHandling) -> Vec<(Endpoint, String)> {
        let mut endpoints = vec![(Endpoint::SsoProcessing, handling.processing.url.pattern().to_string())];
        if let Some(hok) = &handling.hok_processing {
            endpoints.push((Endpoint::SsoHokProcessing, hok.url.pattern().to_string()));
        }
        if let Some(discovery) = &handling.discovery {
            endpoints.push((Endpoint::Discovery, discovery.url.pattern().to_string()));
        }
        if let Some(selection) = &handling.idp_selection_page_url {
            endpoints.push((Endpoint::IdpSelection, selection.clone()));
        }
        endpoints.push((Endpoint::Login, handling.entry_point.login_url.pattern().to_string()));
        endpoints.push((Endpoint::DefaultSuccess, handling.processing.success.default_target_url.clone()));
        endpoints.push((Endpoint::DefaultFailure, handling.processing.failure.default_failure_url.clone()));
        endpoints
    }
}
