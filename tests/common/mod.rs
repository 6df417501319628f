// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Common test utilities for the service provider integration tests.

use samlsp::config::{Config, ConfigError, ConfigProvider, SamlProperties};
use samlsp::{DefaultResourceLoader, ServiceProviderBuilder};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// SHA-256 fingerprint of `tests/fixtures/sp-cert.pem`.
#[allow(dead_code)]
pub const SP_FINGERPRINT: &str = "c8998f753aadb4131ae619eb5ab2159e5391abd1534ea9db6be1db363dbefa12";

/// Entity id declared by `tests/fixtures/idp-metadata.xml`.
#[allow(dead_code)]
pub const IDP_ENTITY_ID: &str = "https://idp.example.com/saml";

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

/// Property provider backed by a map that records every key it is asked for.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct TestConfigProvider {
    values: HashMap<String, Value>,
    lookups: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl TestConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider with the minimal property set for a successful build.
    pub fn minimal() -> Self {
        Self::new()
            .with("saml.key_manager.public_key_pem_location", Value::from("sp-cert.pem"))
            .with("saml.key_manager.private_key_der_location", Value::from("sp-key.der"))
            .with(
                "saml.metadata_manager.metadata_locations",
                Value::from(vec!["idp-metadata.xml"]),
            )
            .with("saml.metadata_generator.entity_id", Value::from("urn:samlsp:test"))
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn was_read(&self, key: &str) -> bool {
        self.lookups.lock().unwrap().iter().any(|k| k == key)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

impl ConfigProvider for TestConfigProvider {
    fn has(&self, key: &str) -> bool {
        self.lookups.lock().unwrap().push(key.to_string());
        self.values.contains_key(key)
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }
}

/// Builder over `provider`, loading resources from the fixtures directory.
pub fn builder_with(provider: Arc<TestConfigProvider>) -> ServiceProviderBuilder {
    let shared: Arc<dyn ConfigProvider> = provider;
    let properties = SamlProperties::new(Config::builder().with_shared_provider(shared).build());
    ServiceProviderBuilder::with_resource_loader(properties, Arc::new(DefaultResourceLoader::new(fixtures_dir())))
}

/// Builder over the minimal property set.
#[allow(dead_code)]
pub fn minimal_builder() -> ServiceProviderBuilder {
    builder_with(Arc::new(TestConfigProvider::minimal()))
}
