// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use super::{BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::error::BuildError;
use crate::saml::{ExtendedMetadata, LocalExtendedMetadata, RemoteExtendedMetadata};

/// Which entity the extended metadata applies to.
pub trait ExtendedMetadataSide: fmt::Debug + Send + Sync + 'static {
    type Artifact: Any + Send + Sync;

    const NAME: &'static str;
    const STAGE: u32;
    const SECTION: &'static str;

    fn defaults() -> ExtendedMetadata;

    fn wrap(metadata: ExtendedMetadata) -> Self::Artifact;
}

/// Remote (IdP) entities.
#[derive(Debug)]
pub struct Remote;

/// The hosted SP.
#[derive(Debug)]
pub struct Local;

impl ExtendedMetadataSide for Remote {
    type Artifact = RemoteExtendedMetadata;

    const NAME: &'static str = "RemoteExtendedMetadata";
    const STAGE: u32 = stage::REMOTE_EXTENDED_METADATA;
    const SECTION: &'static str = "extended_metadata.remote";

    fn defaults() -> ExtendedMetadata {
        ExtendedMetadata::default()
    }

    fn wrap(metadata: ExtendedMetadata) -> RemoteExtendedMetadata {
        RemoteExtendedMetadata(metadata)
    }
}

impl ExtendedMetadataSide for Local {
    type Artifact = LocalExtendedMetadata;

    const NAME: &'static str = "LocalExtendedMetadata";
    const STAGE: u32 = stage::LOCAL_EXTENDED_METADATA;
    const SECTION: &'static str = "extended_metadata.local";

    fn defaults() -> ExtendedMetadata {
        ExtendedMetadata::local()
    }

    fn wrap(metadata: ExtendedMetadata) -> LocalExtendedMetadata {
        LocalExtendedMetadata(metadata)
    }
}

#[derive(Debug)]
pub struct ExtendedMetadataConfigurer<S> {
    instance: Option<ExtendedMetadata>,
    alias: Option<String>,
    idp_discovery_enabled: Option<bool>,
    idp_discovery_url: Option<String>,
    idp_discovery_response_url: Option<String>,
    ecp_enabled: Option<bool>,
    security_profile: Option<String>,
    ssl_security_profile: Option<String>,
    signing_key: Option<String>,
    encryption_key: Option<String>,
    tls_key: Option<String>,
    sign_metadata: Option<bool>,
    require_logout_request_signed: Option<bool>,
    require_logout_response_signed: Option<bool>,
    support_unsolicited_response: Option<bool>,
    side: PhantomData<fn() -> S>,
}

pub type RemoteExtendedMetadataConfigurer = ExtendedMetadataConfigurer<Remote>;
pub type LocalExtendedMetadataConfigurer = ExtendedMetadataConfigurer<Local>;

impl<S> Default for ExtendedMetadataConfigurer<S> {
    fn default() -> Self {
        Self {
            instance: None,
            alias: None,
            idp_discovery_enabled: None,
            idp_discovery_url: None,
            idp_discovery_response_url: None,
            ecp_enabled: None,
            security_profile: None,
            ssl_security_profile: None,
            signing_key: None,
            encryption_key: None,
            tls_key: None,
            sign_metadata: None,
            require_logout_request_signed: None,
            require_logout_response_signed: None,
            support_unsolicited_response: None,
            side: PhantomData,
        }
    }
}

impl<S> ExtendedMetadataConfigurer<S> {
    pub fn extended_metadata(&mut self, metadata: ExtendedMetadata) -> &mut Self {
        self.instance = Some(metadata);
        self
    }

    dsl_setters! {
        alias: String,
        idp_discovery_enabled: bool,
        idp_discovery_url: String,
        idp_discovery_response_url: String,
        ecp_enabled: bool,
        security_profile: String,
        ssl_security_profile: String,
        signing_key: String,
        encryption_key: String,
        tls_key: String,
        sign_metadata: bool,
        require_logout_request_signed: bool,
        require_logout_response_signed: bool,
        support_unsolicited_response: bool,
    }
}

#[async_trait]
impl<S: ExtendedMetadataSide> Facet for ExtendedMetadataConfigurer<S> {
    type Artifact = S::Artifact;

    const NAME: &'static str = S::NAME;
    const STAGE: u32 = S::STAGE;

    fn take_instance(&mut self) -> Option<S::Artifact> {
        self.instance.take().map(S::wrap)
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<S::Artifact, BuildError> {
        let r = Resolver::new(S::NAME, S::SECTION, ctx.properties);
        let d = S::defaults();

        let metadata = ExtendedMetadata {
            local: d.local,
            alias: r.optional(self.alias.clone(), "alias")?.or(d.alias),
            idp_discovery_enabled: r.or_default(self.idp_discovery_enabled, "idp_discovery_enabled", || {
                d.idp_discovery_enabled
            })?,
            idp_discovery_url: r
                .optional(self.idp_discovery_url.clone(), "idp_discovery_url")?
                .or(d.idp_discovery_url),
            idp_discovery_response_url: r
                .optional(self.idp_discovery_response_url.clone(), "idp_discovery_response_url")?
                .or(d.idp_discovery_response_url),
            ecp_enabled: r.or_default(self.ecp_enabled, "ecp_enabled", || d.ecp_enabled)?,
            security_profile: r.or_default(self.security_profile.clone(), "security_profile", || {
                d.security_profile
            })?,
            ssl_security_profile: r.or_default(self.ssl_security_profile.clone(), "ssl_security_profile", || {
                d.ssl_security_profile
            })?,
            signing_key: r.optional(self.signing_key.clone(), "signing_key")?.or(d.signing_key),
            encryption_key: r.optional(self.encryption_key.clone(), "encryption_key")?.or(d.encryption_key),
            tls_key: r.optional(self.tls_key.clone(), "tls_key")?.or(d.tls_key),
            sign_metadata: r.or_default(self.sign_metadata, "sign_metadata", || d.sign_metadata)?,
            require_logout_request_signed: r.or_default(
                self.require_logout_request_signed,
                "require_logout_request_signed",
                || d.require_logout_request_signed,
            )?,
            require_logout_response_signed: r.or_default(
                self.require_logout_response_signed,
                "require_logout_response_signed",
                || d.require_logout_response_signed,
            )?,
            support_unsolicited_response: r.or_default(
                self.support_unsolicited_response,
                "support_unsolicited_response",
                || d.support_unsolicited_response,
            )?,
        };

        Ok(S::wrap(metadata))
    }
}
