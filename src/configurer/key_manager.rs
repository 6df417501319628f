// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::config::properties::defaults;
use crate::error::BuildError;
use crate::saml::KeyManager;
use crate::{debug_fmt, info_fmt};

/// Key material: a PEM certificate with a DER private key, or a PEM bundle.
#[derive(Debug, Default)]
pub struct KeyManagerConfigurer {
    instance: Option<KeyManager>,
    public_key_pem_location: Option<String>,
    private_key_der_location: Option<String>,
    store_location: Option<String>,
    store_pass: Option<String>,
    default_key: Option<String>,
}

impl KeyManagerConfigurer {
    const SECTION: &'static str = "key_manager";

    /// Use a ready-made key manager.
    pub fn key_manager(&mut self, key_manager: KeyManager) -> &mut Self {
        self.instance = Some(key_manager);
        self
    }

    dsl_setters! {
        public_key_pem_location: String,
        private_key_der_location: String,
        /// PEM bundle holding the certificate and (optionally encrypted) key.
        store_location: String,
        store_pass: String,
        default_key: String,
    }
}

#[async_trait]
impl Facet for KeyManagerConfigurer {
    type Artifact = KeyManager;

    const NAME: &'static str = "KeyManager";
    const STAGE: u32 = stage::KEY_MANAGER;

    fn take_instance(&mut self) -> Option<KeyManager> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<KeyManager, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);
        let alias = r.or_default(self.default_key.clone(), "default_key", || {
            defaults::DEFAULT_KEY.to_string()
        })?;

        let pem = r.optional(self.public_key_pem_location.clone(), "public_key_pem_location")?;
        let der = r.optional(self.private_key_der_location.clone(), "private_key_der_location")?;

        let manager = match (pem, der) {
            (Some(pem), Some(der)) => {
                debug_fmt!(Self::NAME, "Loading key pair {} / {}", pem, der);
                let certificate = ctx.resources.load(&pem).await?;
                let private_key = ctx.resources.load(&der).await?;
                KeyManager::from_pem_and_der(&alias, &certificate.content, &private_key.content)
                    .map_err(|e| BuildError::key(Self::NAME, e))?
            }
            (Some(_), None) => return Err(BuildError::missing(Self::NAME, "private_key_der_location")),
            (None, Some(_)) => return Err(BuildError::missing(Self::NAME, "public_key_pem_location")),
            (None, None) => {
                let location = r.required(self.store_location.clone(), "store_location")?;
                let pass = r.optional(self.store_pass.clone(), "store_pass")?;
                debug_fmt!(Self::NAME, "Loading key bundle {}", location);
                let bundle = ctx.resources.load(&location).await?;
                KeyManager::from_pem_bundle(&alias, &bundle.content, pass.as_deref())
                    .map_err(|e| BuildError::key(Self::NAME, e))?
            }
        };

        info_fmt!(Self::NAME, "Loaded key '{}'", alias);
        Ok(manager)
    }
}
