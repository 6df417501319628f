// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configurer units.
//!
//! A [`Configurer`] contributes one facet of the pipeline. The builder drives
//! every registered unit through `init` and then `configure`, exactly once per
//! build, in stage order:
//!
//! | rank | unit                          | artifact                     |
//! |------|-------------------------------|------------------------------|
//! | 100  | key manager                   | `KeyManager`                 |
//! | 200  | TLS                           | `TlsConfiguration`           |
//! | 300  | remote extended metadata      | `RemoteExtendedMetadata`     |
//! | 400  | local extended metadata       | `LocalExtendedMetadata`      |
//! | 500  | metadata manager              | `MetadataManager`            |
//! | 600  | authentication provider       | `AuthenticationProvider`     |
//! | 700  | context provider (LB or not)  | `SamlContextProvider`        |
//! | 800  | processor                     | `SamlProcessor`              |
//! | 900  | WebSSO consumer               | `WebSsoProfileConsumer`      |
//! | 1000 | WebSSO HoK consumer           | `WebSsoProfileHokConsumer`   |
//! | 1100 | WebSSO profile                | `WebSsoProfile`              |
//! | 1200 | WebSSO ECP profile            | `WebSsoProfileEcp`           |
//! | 1300 | WebSSO HoK profile            | `WebSsoProfileHok`           |
//! | 1400 | single logout profile         | `SingleLogoutProfile`        |
//! | 1500 | logout                        | `LogoutHandling`             |
//! | 1600 | SSO                           | `SsoHandling`                |
//! | 1700 | metadata generator            | `MetadataGenerator`          |
//!
//! Ranks are spaced so custom units can slot in between the built-in ones.

/// DSL setters storing `Some(value)` in same-named `Option` fields.
macro_rules! dsl_setters {
    ($($(#[$doc:meta])* $field:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $field(&mut self, value: impl Into<$ty>) -> &mut Self {
                self.$field = Some(value.into());
                self
            }
        )*
    };
}

pub(crate) use dsl_setters;

mod authentication_provider;
mod context_provider;
mod extended_metadata;
mod facet;
mod key_manager;
mod logout;
mod metadata_generator;
mod metadata_manager;
mod processor;
mod profiles;
mod resolver;
mod sso;
mod tls;


pub use authentication_provider::AuthenticationProviderConfigurer;
pub use context_provider::ContextProviderConfigurer;
pub use extended_metadata::{
    ExtendedMetadataConfigurer, ExtendedMetadataSide, Local, LocalExtendedMetadataConfigurer, Remote,
    RemoteExtendedMetadataConfigurer,
};
pub use facet::{Facet, FacetUnit};
pub use key_manager::KeyManagerConfigurer;
pub use logout::LogoutConfigurer;
pub use metadata_generator::MetadataGeneratorConfigurer;
pub use metadata_manager::MetadataManagerConfigurer;
pub use processor::ProcessorConfigurer;
pub use profiles::{
    ConsumerConfigurer, ConsumerKind, ProfileConfigurer, ProfileKind, SingleLogoutProfileConfigurer,
    WebSsoProfileConfigurer, WebSsoProfileConsumerConfigurer, WebSsoProfileEcpConfigurer,
    WebSsoProfileHokConfigurer, WebSsoProfileHokConsumerConfigurer,
};
pub use resolver::Resolver;
pub use sso::SsoConfigurer;
pub use tls::TlsConfigurer;

use async_trait::async_trait;
use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::config::SamlProperties;
use crate::endpoints::{Endpoint, SharedEndpoints, write_registry};
use crate::error::BuildError;
use crate::resources::ResourceLoader;
use crate::store::SharedObjectStore;

/// Stage ranks of the built-in units.
pub mod stage {
    pub const KEY_MANAGER: u32 = 100;
    pub const TLS: u32 = 200;
    pub const REMOTE_EXTENDED_METADATA: u32 = 300;
    pub const LOCAL_EXTENDED_METADATA: u32 = 400;
    pub const METADATA_MANAGER: u32 = 500;
    pub const AUTHENTICATION_PROVIDER: u32 = 600;
    pub const CONTEXT_PROVIDER: u32 = 700;
    pub const PROCESSOR: u32 = 800;
    pub const WEB_SSO_PROFILE_CONSUMER: u32 = 900;
    pub const WEB_SSO_PROFILE_HOK_CONSUMER: u32 = 1000;
    pub const WEB_SSO_PROFILE: u32 = 1100;
    pub const WEB_SSO_PROFILE_ECP: u32 = 1200;
    pub const WEB_SSO_PROFILE_HOK: u32 = 1300;
    pub const SINGLE_LOGOUT_PROFILE: u32 = 1400;
    pub const LOGOUT: u32 = 1500;
    pub const SSO: u32 = 1600;
    pub const METADATA_GENERATOR: u32 = 1700;
}

/// Identity of an artifact type, used to order units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactType {
    pub id: TypeId,
    pub name: &'static str,
}

impl ArtifactType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Everything a unit may touch while the pipeline is being built.
pub struct BuildContext<'a> {
    pub store: &'a mut SharedObjectStore,
    pub endpoints: &'a SharedEndpoints,
    pub properties: &'a SamlProperties,
    pub resources: &'a dyn ResourceLoader,
}

impl fmt::Debug for BuildContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("store", &self.store)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

impl BuildContext<'_> {
    /// Claim `endpoint` for `owner` in the shared registry.
    pub fn claim(&self, endpoint: Endpoint, pattern: &str, owner: &str) -> Result<(), BuildError> {
        write_registry(self.endpoints, owner)?.claim(endpoint, pattern, owner)
    }
}

/// One facet of the pipeline.
///
/// `init` runs for every unit before any unit is configured; `configure` then
/// resolves and publishes the unit's artifacts. Each runs once per build.
#[async_trait]
pub trait Configurer: Any + fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Stage rank; lower ranks are configured first.
    fn rank(&self) -> u32;

    /// Artifact types this unit publishes.
    fn provides(&self) -> Vec<ArtifactType> {
        Vec::new()
    }

    /// Artifact types that must be published before this unit is configured.
    fn requires(&self) -> Vec<ArtifactType> {
        Vec::new()
    }

    fn init(&mut self, ctx: &BuildContext<'_>) -> Result<(), BuildError>;

    async fn configure(&mut self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
