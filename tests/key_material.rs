// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key manager loading through the build: PEM + DER pairs and PEM bundles.

use samlsp::error::{BuildError, KeyError};
use serde_json::Value;
use std::sync::Arc;

mod common;
use common::{SP_FINGERPRINT, TestConfigProvider, builder_with, fixture, fixtures_dir};

fn without_keys() -> TestConfigProvider {
    TestConfigProvider::new()
        .with(
            "saml.metadata_manager.metadata_locations",
            Value::from(vec!["idp-metadata.xml"]),
        )
        .with("saml.metadata_generator.entity_id", Value::from("urn:samlsp:keys"))
}

#[tokio::test]
async fn test_pem_and_der_pair_under_default_alias() {
    let provider = Arc::new(
        without_keys()
            .with("saml.key_manager.public_key_pem_location", Value::from("sp-cert.pem"))
            .with("saml.key_manager.private_key_der_location", Value::from("sp-key.der")),
    );
    let pipeline = builder_with(provider).build().await.unwrap();

    let keys = &pipeline.components().key_manager;
    assert_eq!(keys.default_key(), "localhost");
    assert_eq!(keys.aliases(), vec!["localhost"]);
    assert_eq!(pipeline.describe().key_fingerprints["localhost"], SP_FINGERPRINT);
}

#[tokio::test]
async fn test_pem_and_der_pair_through_dsl() {
    let mut builder = builder_with(Arc::new(without_keys()));
    builder.key_manager(|keys| {
        keys.public_key_pem_location(fixture("sp-cert.pem"))
            .private_key_der_location(format!("file:{}", fixture("sp-key.der")))
            .default_key("sp");
    });
    let pipeline = builder.build().await.unwrap();

    assert_eq!(pipeline.components().key_manager.default_key(), "sp");
    assert_eq!(pipeline.describe().key_fingerprints["sp"], SP_FINGERPRINT);
}

#[tokio::test]
async fn test_bundle_with_passphrase() {
    let provider = Arc::new(
        without_keys()
            .with("saml.key_manager.store_location", Value::from("classpath:sp-bundle.pem"))
            .with("saml.key_manager.store_pass", Value::from("changeit"))
            .with("saml.key_manager.default_key", Value::from("bundle")),
    );
    let pipeline = builder_with(provider).build().await.unwrap();

    // the bundle wraps the same certificate as sp-cert.pem
    assert_eq!(pipeline.describe().key_fingerprints["bundle"], SP_FINGERPRINT);
}

#[tokio::test]
async fn test_bundle_with_wrong_passphrase() {
    let provider = Arc::new(
        without_keys()
            .with("saml.key_manager.store_location", Value::from("sp-bundle.pem"))
            .with("saml.key_manager.store_pass", Value::from("wrong")),
    );

    match builder_with(provider).build().await {
        Err(BuildError::Key { facet, .. }) => assert_eq!(facet, "KeyManager"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_mismatched_pair() {
    let provider = Arc::new(
        without_keys()
            .with("saml.key_manager.public_key_pem_location", Value::from("sp-cert.pem"))
            .with("saml.key_manager.private_key_der_location", Value::from("other-key.der")),
    );

    match builder_with(provider).build().await {
        Err(BuildError::Key {
            source: KeyError::Mismatch(alias),
            ..
        }) => assert_eq!(alias, "localhost"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_no_key_source_is_missing_store_location() {
    match builder_with(Arc::new(without_keys())).build().await {
        Err(BuildError::MissingValue { facet, attribute }) => {
            assert_eq!(facet, "KeyManager");
            assert_eq!(attribute, "store_location");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_key_copied_to_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["sp-cert.pem", "sp-key.der", "idp-metadata.xml"] {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name)).unwrap();
    }

    let provider = Arc::new(
        without_keys()
            .with(
                "saml.key_manager.public_key_pem_location",
                Value::from(dir.path().join("sp-cert.pem").to_string_lossy().into_owned()),
            )
            .with("saml.key_manager.private_key_der_location", Value::from("sp-key.der")),
    );
    let shared: Arc<dyn samlsp::ConfigProvider> = provider;
    let properties = samlsp::SamlProperties::new(samlsp::Config::builder().with_shared_provider(shared).build());
    let mut builder = samlsp::ServiceProviderBuilder::with_resource_loader(
        properties,
        Arc::new(samlsp::DefaultResourceLoader::new(dir.path())),
    );

    let pipeline = builder.build().await.unwrap();
    assert_eq!(pipeline.describe().key_fingerprints["localhost"], SP_FINGERPRINT);
    assert!(
        pipeline.describe().metadata_locations[0].ends_with("idp-metadata.xml"),
        "metadata read relative to the loader base dir"
    );
}
