// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily read SAML property defaults.
//!
//! Nothing is bound up front: every attribute is looked up in the provider
//! stack at the moment a configurer falls through to the property tier. A key
//! that is never needed is never read.
//!
//! | key | default |
//! |-----|---------|
//! | `saml.key_manager.public_key_pem_location`   | – |
//! | `saml.key_manager.private_key_der_location`  | – |
//! | `saml.key_manager.store_location`            | – |
//! | `saml.key_manager.store_pass`                | – |
//! | `saml.key_manager.default_key`               | `localhost` |
//! | `saml.tls.protocol`                          | `https` |
//! | `saml.tls.ssl_hostname_verification`         | `default` |
//! | `saml.tls.trusted_keys`                      | all keys |
//! | `saml.extended_metadata.{local,remote}.*`    | see [`crate::saml::ExtendedMetadata`] |
//! | `saml.metadata_manager.metadata_locations`   | – (required) |
//! | `saml.metadata_manager.default_idp`          | – |
//! | `saml.metadata_manager.hosted_sp_name`       | – |
//! | `saml.metadata_manager.refresh_check_interval_ms` | – (never) |
//! | `saml.metadata_manager.metadata_trust_check` | `true` |
//! | `saml.authentication_provider.exclude_credential`        | `false` |
//! | `saml.authentication_provider.force_principal_as_string` | `false` |
//! | `saml.context_provider.lb.enabled`           | `false` |
//! | `saml.context_provider.lb.scheme`            | `http` |
//! | `saml.context_provider.lb.server_name`       | `localhost` |
//! | `saml.context_provider.lb.server_port`       | `8080` |
//! | `saml.context_provider.lb.include_server_port_in_request_url` | `false` |
//! | `saml.context_provider.lb.context_path`      | `/` |
//! | `saml.processor.{redirect,post,artifact,soap,paos}` | `true` |
//! | `saml.web_sso_profile_consumer.*`            | see [`crate::saml::ConsumerSettings`] |
//! | `saml.web_sso_profile_hok_consumer.*`        | see [`crate::saml::ConsumerSettings`] |
//! | `saml.web_sso_profile*.response_skew`        | `60` |
//! | `saml.single_logout_profile.response_skew`   | `60` |
//! | `saml.sso.*`                                 | see [`defaults`] |
//! | `saml.logout.*`                              | see [`defaults`] |
//! | `saml.metadata_generator.entity_id`          | – (required) |
//! | `saml.metadata_generator.metadata_url`       | `/saml/metadata` |

use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::{Config, ConfigError};

/// Root under which every SAML property lives.
pub const ROOT: &str = "saml";

/// Documented literal defaults of the endpoint URL surface.
pub mod defaults {
    pub const SSO_PROCESSING_URL: &str = "/saml/SSO";
    pub const SSO_HOK_PROCESSING_URL: &str = "/saml/HoKSSO";
    pub const DISCOVERY_PROCESSING_URL: &str = "/saml/discovery";
    pub const IDP_SELECTION_PAGE_URL: &str = "/idpselection";
    pub const SSO_LOGIN_URL: &str = "/saml/login";
    pub const DEFAULT_SUCCESS_URL: &str = "/";
    pub const DEFAULT_FAILURE_URL: &str = "/error";
    pub const METADATA_URL: &str = "/saml/metadata";
    pub const LOGOUT_URL: &str = "/saml/logout";
    pub const SINGLE_LOGOUT_URL: &str = "/saml/SingleLogout";
    pub const LOGOUT_DEFAULT_TARGET_URL: &str = "/";
    pub const DEFAULT_KEY: &str = "localhost";
    pub const RESPONSE_SKEW: u64 = 60;
}

/// Typed, lazy view over the `saml.` part of a [`Config`].
#[derive(Debug, Clone)]
pub struct SamlProperties {
    config: Arc<Config>,
}

impl Default for SamlProperties {
    fn default() -> Self {
        Self::new(Config::empty())
    }
}

impl SamlProperties {
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config) }
    }

    pub fn from_shared(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full key for a field of a facet section, e.g. `saml.sso.sso_login_url`.
    pub fn key(&self, section: &str, field: &str) -> String {
        format!("{ROOT}.{section}.{field}")
    }

    /// Read `saml.<section>.<field>`.
    pub fn get<T: DeserializeOwned>(&self, section: &str, field: &str) -> Result<Option<T>, ConfigError> {
        self.config.get(&self.key(section, field))
    }
}
