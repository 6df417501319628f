// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::error::BuildError;
use crate::saml::AuthenticationProvider;

/// The consumers are wired in by the assembler; they are configured later.
#[derive(Debug, Default)]
pub struct AuthenticationProviderConfigurer {
    instance: Option<AuthenticationProvider>,
    exclude_credential: Option<bool>,
    force_principal_as_string: Option<bool>,
}

impl AuthenticationProviderConfigurer {
    const SECTION: &'static str = "authentication_provider";

    pub fn authentication_provider(&mut self, provider: AuthenticationProvider) -> &mut Self {
        self.instance = Some(provider);
        self
    }

    dsl_setters! {
        exclude_credential: bool,
        force_principal_as_string: bool,
    }
}

#[async_trait]
impl Facet for AuthenticationProviderConfigurer {
    type Artifact = AuthenticationProvider;

    const NAME: &'static str = "AuthenticationProvider";
    const STAGE: u32 = stage::AUTHENTICATION_PROVIDER;

    fn take_instance(&mut self) -> Option<AuthenticationProvider> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<AuthenticationProvider, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        Ok(AuthenticationProvider {
            exclude_credential: r.or_default(self.exclude_credential, "exclude_credential", || false)?,
            force_principal_as_string: r.or_default(
                self.force_principal_as_string,
                "force_principal_as_string",
                || false,
            )?,
            ..AuthenticationProvider::default()
        })
    }
}
