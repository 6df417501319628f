// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SAML service provider components.
//!
//! These are the artifacts the configurers publish into the shared object
//! store. Cross references between them (`Option<Arc<_>>` fields) stay empty
//! until the pipeline assembler injects them; [`Component::finish_init`] then
//! verifies that every required collaborator is present.

pub mod filters;
pub mod keys;
pub mod metadata;
pub mod profiles;

pub use filters::{
    FailureHandler, LogoutHandling, MetadataDisplayFilter, MetadataGeneratorFilter, SamlDiscovery,
    SamlEntryPoint, SamlLogoutFilter, SamlLogoutProcessingFilter, SamlProcessingFilter,
    SecurityFilter, SsoHandling, SuccessHandler,
};
pub use keys::{KeyEntry, KeyManager};
pub use metadata::{
    ExtendedMetadata, LocalExtendedMetadata, MetadataGenerator, MetadataManager, MetadataProvider,
    RemoteExtendedMetadata,
};
pub use profiles::{
    AuthenticationProvider, Binding, ConsumerSettings, ContextProviderKind, HostnameVerification,
    LoadBalancerSettings, ProfileOptions, SamlContextProvider, SamlProcessor, SingleLogoutProfile,
    TlsConfiguration, WebSsoProfile, WebSsoProfileConsumer, WebSsoProfileEcp, WebSsoProfileHok,
    WebSsoProfileHokConsumer,
};

use std::fmt;
use std::sync::Arc;

use crate::error::BuildError;

/// A long-lived pipeline component.
pub trait Component: fmt::Debug + Send + Sync {
    fn component_name(&self) -> &'static str;

    /// Called once by the assembler after all references are injected.
    fn finish_init(&self) -> Result<(), BuildError> {
        Ok(())
    }
}

/// Fail initialization of `component` when a reference was never injected.
pub(crate) fn require<T>(component: &'static str, field: &str, value: &Option<Arc<T>>) -> Result<(), BuildError> {
    match value {
        Some(_) => Ok(()),
        None => Err(BuildError::init(component, format!("{field} was not injected"))),
    }
}
