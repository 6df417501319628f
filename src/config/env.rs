// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Environment variable-based configuration provider implementation.
//!
//! Nesting levels are separated by a double underscore so that snake_case
//! field names survive: `SAMLSP_SAML__KEY_MANAGER__DEFAULT_KEY` maps to
//! `saml.key_manager.default_key`.

use std::collections::HashMap;
use std::env;
use serde_json::{Value, json};

use super::ConfigProvider;
use super::ConfigError;

const NESTING_SEPARATOR: &str = "__";

/// Configuration provider that retrieves values from environment variables.
#[derive(Debug)]
pub struct EnvConfigProvider {
    /// Prefix for environment variables (e.g., "SAMLSP_").
    prefix: String,
    /// Cache of environment variables that match the prefix.
    cache: HashMap<String, String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable configuration provider with the specified prefix.
    pub fn new(prefix: &str) -> Self {
        let mut provider = Self {
            prefix: prefix.to_string(),
            cache: HashMap::new(),
        };

        provider.refresh_cache();

        provider
    }

    /// Refresh the cache of environment variables.
    pub fn refresh_cache(&mut self) {
        self.cache.clear();

        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(&self.prefix) {
                let config_key = stripped
                    .split(NESTING_SEPARATOR)
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
                    .join(".");

                self.cache.insert(config_key, value);
            }
        }
    }

    /// Parse a string value into a JSON Value.
    fn parse_value_to_json(&self, value: &str) -> Result<Value, ConfigError> {
        if let Ok(json_value) = serde_json::from_str(value) {
            return Ok(json_value);
        }

        if value.eq_ignore_ascii_case("true") {
            return Ok(json!(true));
        } else if value.eq_ignore_ascii_case("false") {
            return Ok(json!(false));
        }

        if let Ok(int_val) = value.parse::<i64>() {
            return Ok(json!(int_val));
        }

        if let Ok(float_val) = value.parse::<f64>() {
            return Ok(json!(float_val));
        }

        Ok(json!(value))
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new("SAMLSP_")
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        match self.cache.get(key) {
            Some(value) => self.parse_value_to_json(value).map(Some),
            None => Ok(None),
        }
    }

    fn has(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    fn provider_name(&self) -> &str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use serial_test::serial;
    use crate::config::ConfigProviderExt;

    #[test]
    #[serial]
    fn test_env_provider() {
        unsafe {
            env::set_var("SAMLSP_SAML__SSO__SSO_LOGIN_URL", "/sso/login");
            env::set_var("SAMLSP_SAML__CONTEXT_PROVIDER__LB__SERVER_PORT", "8443");
            env::set_var("SAMLSP_SAML__SSO__ENABLE_SSO_HOK", "false");
        }

        let provider = EnvConfigProvider::default();

        assert!(provider.has("saml.sso.sso_login_url"));
        assert!(!provider.has("saml.sso.nonexistent"));

        let login: String = provider.get("saml.sso.sso_login_url").unwrap().unwrap();
        assert_eq!(login, "/sso/login");

        let port: u16 = provider.get("saml.context_provider.lb.server_port").unwrap().unwrap();
        assert_eq!(port, 8443);

        let hok: bool = provider.get("saml.sso.enable_sso_hok").unwrap().unwrap();
        assert!(!hok);

        unsafe {
            env::remove_var("SAMLSP_SAML__SSO__SSO_LOGIN_URL");
            env::remove_var("SAMLSP_SAML__CONTEXT_PROVIDER__LB__SERVER_PORT");
            env::remove_var("SAMLSP_SAML__SSO__ENABLE_SSO_HOK");
        }
    }

    #[test]
    #[serial]
    fn test_custom_prefix() {
        unsafe {
            env::set_var("CUSTOM_SAML__KEY_MANAGER__DEFAULT_KEY", "apollo");
        }

        let provider = EnvConfigProvider::new("CUSTOM_");

        let alias: String = provider.get("saml.key_manager.default_key").unwrap().unwrap();
        assert_eq!(alias, "apollo");

        unsafe {
            env::remove_var("CUSTOM_SAML__KEY_MANAGER__DEFAULT_KEY");
        }
    }

    #[test]
    #[serial]
    fn test_cache_refresh() {
        let mut provider = EnvConfigProvider::new("SAMLSP_TEST_");

        assert!(!provider.has("value"));

        unsafe {
            env::set_var("SAMLSP_TEST_VALUE", "42");
        }

        // Not visible until the cache is refreshed
        assert!(!provider.has("value"));

        provider.refresh_cache();

        assert!(provider.has("value"));
        let value: i32 = provider.get("value").unwrap().unwrap();
        assert_eq!(value, 42);

        unsafe {
            env::remove_var("SAMLSP_TEST_VALUE");
        }
    }

    #[test]
    #[serial]
    fn test_array_values() {
        unsafe {
            env::set_var(
                "SAMLSP_SAML__METADATA_MANAGER__METADATA_LOCATIONS",
                r#"["file:/etc/idp.xml", "https://idp.example.com/metadata"]"#,
            );
        }

        let provider = EnvConfigProvider::default();
        let locations: Vec<String> = provider
            .get("saml.metadata_manager.metadata_locations")
            .unwrap()
            .unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[1], "https://idp.example.com/metadata");

        unsafe {
            env::remove_var("SAMLSP_SAML__METADATA_MANAGER__METADATA_LOCATIONS");
        }
    }

    #[test]
    #[serial]
    fn test_invalid_json_value_is_string() {
        unsafe {
            env::set_var("SAMLSP_SAML__SSO__PROFILE_OPTIONS__RELAY_STATE", "{not json}");
        }

        let provider = EnvConfigProvider::default();
        let value: String = provider.get("saml.sso.profile_options.relay_state").unwrap().unwrap();
        assert_eq!(value, "{not json}");

        unsafe {
            env::remove_var("SAMLSP_SAML__SSO__PROFILE_OPTIONS__RELAY_STATE");
        }
    }

    #[test]
    fn test_empty_environment() {
        let provider = EnvConfigProvider::new("NONEXISTENT_PREFIX_");

        assert!(!provider.has("any.key"));
        let result: Option<String> = provider.get("any.key").unwrap();
        assert!(result.is_none());
        assert_eq!(provider.provider_name(), "env");
    }
}
