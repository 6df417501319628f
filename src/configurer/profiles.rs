// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WebSSO consumers and the WebSSO/ECP/HoK/single-logout profiles.

use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;

use super::{ArtifactType, BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::config::properties::defaults;
use crate::error::BuildError;
use crate::saml::profiles::{Consumer, Profile, kind};
use crate::saml::{ConsumerSettings, MetadataManager, SamlProcessor};

/// Consumer variants with their unit name, rank and property section.
pub trait ConsumerKind: fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;
    const STAGE: u32;
    const SECTION: &'static str;
}

impl ConsumerKind for kind::WebSso {
    const NAME: &'static str = "WebSsoProfileConsumer";
    const STAGE: u32 = stage::WEB_SSO_PROFILE_CONSUMER;
    const SECTION: &'static str = "web_sso_profile_consumer";
}

impl ConsumerKind for kind::HolderOfKey {
    const NAME: &'static str = "WebSsoProfileHokConsumer";
    const STAGE: u32 = stage::WEB_SSO_PROFILE_HOK_CONSUMER;
    const SECTION: &'static str = "web_sso_profile_hok_consumer";
}

#[derive(Debug)]
pub struct ConsumerConfigurer<K> {
    instance: Option<Consumer<K>>,
    max_authentication_age: Option<u64>,
    max_assertion_time: Option<u64>,
    response_skew: Option<u64>,
    release_dom: Option<bool>,
    include_all_attributes: Option<bool>,
}

pub type WebSsoProfileConsumerConfigurer = ConsumerConfigurer<kind::WebSso>;
pub type WebSsoProfileHokConsumerConfigurer = ConsumerConfigurer<kind::HolderOfKey>;

impl<K> Default for ConsumerConfigurer<K> {
    fn default() -> Self {
        Self {
            instance: None,
            max_authentication_age: None,
            max_assertion_time: None,
            response_skew: None,
            release_dom: None,
            include_all_attributes: None,
        }
    }
}

impl<K> ConsumerConfigurer<K> {
    pub fn consumer(&mut self, consumer: Consumer<K>) -> &mut Self {
        self.instance = Some(consumer);
        self
    }

    dsl_setters! {
        /// Seconds since the user authenticated at the IdP.
        max_authentication_age: u64,
        /// Seconds an assertion stays acceptable after issuance.
        max_assertion_time: u64,
        response_skew: u64,
        release_dom: bool,
        include_all_attributes: bool,
    }
}

#[async_trait]
impl<K: ConsumerKind> Facet for ConsumerConfigurer<K> {
    type Artifact = Consumer<K>;

    const NAME: &'static str = K::NAME;
    const STAGE: u32 = K::STAGE;

    fn requires() -> Vec<ArtifactType> {
        vec![ArtifactType::of::<SamlProcessor>(), ArtifactType::of::<MetadataManager>()]
    }

    fn take_instance(&mut self) -> Option<Consumer<K>> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<Consumer<K>, BuildError> {
        let r = Resolver::new(K::NAME, K::SECTION, ctx.properties);
        let d = ConsumerSettings::default();

        Ok(Consumer::new(ConsumerSettings {
            max_authentication_age: r.or_default(self.max_authentication_age, "max_authentication_age", || {
                d.max_authentication_age
            })?,
            max_assertion_time: r.or_default(self.max_assertion_time, "max_assertion_time", || {
                d.max_assertion_time
            })?,
            response_skew: r.or_default(self.response_skew, "response_skew", || d.response_skew)?,
            release_dom: r.or_default(self.release_dom, "release_dom", || d.release_dom)?,
            include_all_attributes: r.or_default(self.include_all_attributes, "include_all_attributes", || {
                d.include_all_attributes
            })?,
        }))
    }
}

/// Profile variants with their unit name, rank and property section.
pub trait ProfileKind: fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;
    const STAGE: u32;
    const SECTION: &'static str;
}

impl ProfileKind for kind::WebSso {
    const NAME: &'static str = "WebSsoProfile";
    const STAGE: u32 = stage::WEB_SSO_PROFILE;
    const SECTION: &'static str = "web_sso_profile";
}

impl ProfileKind for kind::Ecp {
    const NAME: &'static str = "WebSsoProfileEcp";
    const STAGE: u32 = stage::WEB_SSO_PROFILE_ECP;
    const SECTION: &'static str = "web_sso_profile_ecp";
}

impl ProfileKind for kind::HolderOfKey {
    const NAME: &'static str = "WebSsoProfileHok";
    const STAGE: u32 = stage::WEB_SSO_PROFILE_HOK;
    const SECTION: &'static str = "web_sso_profile_hok";
}

impl ProfileKind for kind::SingleLogout {
    const NAME: &'static str = "SingleLogoutProfile";
    const STAGE: u32 = stage::SINGLE_LOGOUT_PROFILE;
    const SECTION: &'static str = "single_logout_profile";
}

#[derive(Debug)]
pub struct ProfileConfigurer<K> {
    instance: Option<Profile<K>>,
    response_skew: Option<u64>,
    kind: PhantomData<fn() -> K>,
}

pub type WebSsoProfileConfigurer = ProfileConfigurer<kind::WebSso>;
pub type WebSsoProfileEcpConfigurer = ProfileConfigurer<kind::Ecp>;
pub type WebSsoProfileHokConfigurer = ProfileConfigurer<kind::HolderOfKey>;
pub type SingleLogoutProfileConfigurer = ProfileConfigurer<kind::SingleLogout>;

impl<K> Default for ProfileConfigurer<K> {
    fn default() -> Self {
        Self {
            instance: None,
            response_skew: None,
            kind: PhantomData,
        }
    }
}

impl<K> ProfileConfigurer<K> {
    pub fn profile(&mut self, profile: Profile<K>) -> &mut Self {
        self.instance = Some(profile);
        self
    }

    dsl_setters! {
        /// Allowed clock skew in seconds.
        response_skew: u64,
    }
}

#[async_trait]
impl<K: ProfileKind> Facet for ProfileConfigurer<K> {
    type Artifact = Profile<K>;

    const NAME: &'static str = K::NAME;
    const STAGE: u32 = K::STAGE;

    fn requires() -> Vec<ArtifactType> {
        vec![ArtifactType::of::<SamlProcessor>(), ArtifactType::of::<MetadataManager>()]
    }

    fn take_instance(&mut self) -> Option<Profile<K>> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<Profile<K>, BuildError> {
        let r = Resolver::new(K::NAME, K::SECTION, ctx.properties);
        let skew = r.or_default(self.response_skew, "response_skew", || defaults::RESPONSE_SKEW)?;
        Ok(Profile::new(skew))
    }
}
