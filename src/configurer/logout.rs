// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{ArtifactType, BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::config::properties::defaults;
use crate::endpoints::{AntPathMatcher, Endpoint};
use crate::error::BuildError;
use crate::saml::{LogoutHandling, SamlLogoutFilter, SamlLogoutProcessingFilter, SingleLogoutProfile};

/// Local logout plus single logout processing.
#[derive(Debug, Default)]
pub struct LogoutConfigurer {
    instance: Option<LogoutHandling>,
    logout_url: Option<String>,
    single_logout_url: Option<String>,
    default_target_url: Option<String>,
    clear_authentication: Option<bool>,
    invalidate_session: Option<bool>,
}

impl LogoutConfigurer {
    const SECTION: &'static str = "logout";

    pub fn logout_handling(&mut self, handling: LogoutHandling) -> &mut Self {
        self.instance = Some(handling);
        self
    }

    dsl_setters! {
        logout_url: String,
        single_logout_url: String,
        /// Landing page after logout.
        default_target_url: String,
        clear_authentication: bool,
        invalidate_session: bool,
    }
}

#[async_trait]
impl Facet for LogoutConfigurer {
    type Artifact = LogoutHandling;

    const NAME: &'static str = "Logout";
    const STAGE: u32 = stage::LOGOUT;

    fn requires() -> Vec<ArtifactType> {
        vec![ArtifactType::of::<SingleLogoutProfile>()]
    }

    fn take_instance(&mut self) -> Option<LogoutHandling> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<LogoutHandling, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        let logout_url = r.or_default(self.logout_url.clone(), "logout_url", || {
            defaults::LOGOUT_URL.to_string()
        })?;
        let single_logout_url = r.or_default(self.single_logout_url.clone(), "single_logout_url", || {
            defaults::SINGLE_LOGOUT_URL.to_string()
        })?;
        let default_target_url = r.or_default(self.default_target_url.clone(), "default_target_url", || {
            defaults::LOGOUT_DEFAULT_TARGET_URL.to_string()
        })?;
        let clear_authentication = r.or_default(self.clear_authentication, "clear_authentication", || true)?;
        let invalidate_session = r.or_default(self.invalidate_session, "invalidate_session", || true)?;

        Ok(LogoutHandling {
            logout: SamlLogoutFilter {
                url: AntPathMatcher::new(&logout_url)?,
                success_target_url: default_target_url.clone(),
                clear_authentication,
                invalidate_session,
                profile: None,
                context: None,
            },
            processing: SamlLogoutProcessingFilter {
                url: AntPathMatcher::new(&single_logout_url)?,
                success_target_url: default_target_url.clone(),
                clear_authentication,
                invalidate_session,
                profile: None,
                processor: None,
                context: None,
            },
            default_target_url,
        })
    }

    fn endpoints(handling: &LogoutHandling) -> Vec<(Endpoint, String)> {
        vec![
            (Endpoint::Logout, handling.logout.url.pattern().to_string()),
            (Endpoint::SingleLogout, handling.processing.url.pattern().to_string()),
            (Endpoint::LogoutTarget, handling.default_target_url.clone()),
        ]
    }
}
