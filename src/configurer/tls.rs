// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{ArtifactType, BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::error::BuildError;
use crate::saml::{HostnameVerification, KeyManager, TlsConfiguration};

#[derive(Debug, Default)]
pub struct TlsConfigurer {
    instance: Option<TlsConfiguration>,
    protocol: Option<String>,
    ssl_hostname_verification: Option<HostnameVerification>,
    trusted_keys: Option<Vec<String>>,
}

impl TlsConfigurer {
    const SECTION: &'static str = "tls";

    pub fn tls_configuration(&mut self, tls: TlsConfiguration) -> &mut Self {
        self.instance = Some(tls);
        self
    }

    dsl_setters! {
        protocol: String,
        ssl_hostname_verification: HostnameVerification,
        /// Aliases trusted for TLS; defaults to every key of the key manager.
        trusted_keys: Vec<String>,
    }
}

#[async_trait]
impl Facet for TlsConfigurer {
    type Artifact = TlsConfiguration;

    const NAME: &'static str = "Tls";
    const STAGE: u32 = stage::TLS;

    fn requires() -> Vec<ArtifactType> {
        vec![ArtifactType::of::<KeyManager>()]
    }

    fn take_instance(&mut self) -> Option<TlsConfiguration> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<TlsConfiguration, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        Ok(TlsConfiguration {
            protocol: r.or_default(self.protocol.clone(), "protocol", || "https".to_string())?,
            hostname_verification: r.or_default(
                self.ssl_hostname_verification,
                "ssl_hostname_verification",
                HostnameVerification::default,
            )?,
            trusted_keys: r.optional(self.trusted_keys.clone(), "trusted_keys")?,
            key_manager: None,
        })
    }
}
