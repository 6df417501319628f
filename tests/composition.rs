// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Precedence, endpoint and determinism tests for whole pipeline builds.

use samlsp::saml::{Binding, KeyManager, SamlProcessor, SecurityFilter, TlsConfiguration, WebSsoProfileConsumer};
use samlsp::{Access, BuildError, Endpoint};
use serde_json::Value;
use std::sync::Arc;

mod common;
use common::{SP_FINGERPRINT, TestConfigProvider, builder_with, fixture, minimal_builder};

#[tokio::test]
async fn test_default_paths_are_public() {
    let pipeline = minimal_builder().build().await.unwrap();
    let matcher = pipeline.matcher();

    for path in [
        "/saml/SSO",
        "/saml/HoKSSO",
        "/saml/discovery",
        "/idpselection",
        "/saml/login",
        "/saml/metadata",
        "/saml/logout",
        "/saml/SingleLogout",
        "/error",
    ] {
        assert!(matcher.matches(path), "{path} should be public");
    }
    assert!(!matcher.matches("/sanity-check"));
    assert!(!matcher.matches("/"));
    assert_eq!(pipeline.authorize("/sanity-check"), Access::Authenticate);
    assert_eq!(pipeline.authorize("/saml/SSO"), Access::Permit);
}

#[tokio::test]
async fn test_custom_sso_processing_url() {
    let mut builder = minimal_builder();
    builder.sso(|sso| {
        sso.sso_processing_url("/custom/sso");
    });
    let pipeline = builder.build().await.unwrap();

    assert_eq!(pipeline.endpoint(Endpoint::SsoProcessing).as_deref(), Some("/custom/sso"));
    assert!(pipeline.matcher().matches("/custom/sso"));
    assert!(!pipeline.matcher().matches("/saml/SSO"));
    assert_eq!(pipeline.filter_for("/custom/sso").map(|f| f.name()), Some("saml-processing"));
}

#[tokio::test]
async fn test_dsl_short_circuits_property_reads() {
    let provider = Arc::new(
        TestConfigProvider::minimal().with("saml.sso.sso_login_url", Value::from("/from-properties")),
    );
    let mut builder = builder_with(Arc::clone(&provider));
    builder.sso(|sso| {
        sso.sso_login_url("/from-dsl");
    });
    let pipeline = builder.build().await.unwrap();

    assert_eq!(pipeline.describe().entry_point_url, "/from-dsl");
    assert!(!provider.was_read("saml.sso.sso_login_url"));
    assert!(provider.was_read("saml.sso.sso_processing_url"));
}

#[tokio::test]
async fn test_properties_override_documented_defaults() {
    let provider = Arc::new(
        TestConfigProvider::minimal()
            .with("saml.logout.logout_url", Value::from("/bye"))
            .with("saml.sso.enable_discovery", Value::from(false)),
    );
    let pipeline = builder_with(provider).build().await.unwrap();

    assert_eq!(pipeline.endpoint(Endpoint::Logout).as_deref(), Some("/bye"));
    assert!(pipeline.matcher().matches("/bye"));
    assert!(!pipeline.matcher().matches("/saml/logout"));
    assert_eq!(pipeline.endpoint(Endpoint::Discovery), None);
    assert_eq!(pipeline.endpoint(Endpoint::IdpSelection), None);
    assert!(!pipeline.chain().names().contains(&"saml-discovery"));
    assert!(pipeline.entry_point().discovery_url.is_none());
}

#[tokio::test]
async fn test_discovery_follows_local_extended_metadata() {
    let provider = Arc::new(
        TestConfigProvider::minimal().with("saml.extended_metadata.local.idp_discovery_enabled", Value::from(false)),
    );
    let pipeline = builder_with(provider).build().await.unwrap();
    assert!(!pipeline.chain().names().contains(&"saml-discovery"));
    assert_eq!(pipeline.endpoint(Endpoint::Discovery), None);

    let pipeline = minimal_builder().build().await.unwrap();
    assert!(pipeline.chain().names().contains(&"saml-discovery"));
    assert_eq!(pipeline.entry_point().discovery_url.as_deref(), Some("/saml/discovery"));
}

#[tokio::test]
async fn test_explicit_component_wins_over_dsl_and_properties() {
    let provider = Arc::new(TestConfigProvider::minimal().with("saml.tls.protocol", Value::from("tlsv1.3")));
    let mut builder = builder_with(Arc::clone(&provider));

    let explicit = TlsConfiguration {
        protocol: "explicit".to_string(),
        ..TlsConfiguration::default()
    };
    builder.register_component(explicit).unwrap();
    builder.tls(|tls| {
        tls.protocol("dsl");
    });
    let pipeline = builder.build().await.unwrap();

    let tls = &pipeline.components().tls;
    assert_eq!(tls.protocol, "explicit");
    assert!(!provider.was_read("saml.tls.protocol"));
    // references are still injected into the explicit component
    assert!(Arc::ptr_eq(tls.key_manager.as_ref().unwrap(), &pipeline.components().key_manager));
}

#[tokio::test]
async fn test_explicit_key_manager_skips_loading() {
    let pem = std::fs::read(fixture("sp-cert.pem")).unwrap();
    let der = std::fs::read(fixture("sp-key.der")).unwrap();
    let keys = KeyManager::from_pem_and_der("explicit", &pem, &der).unwrap();

    let provider = Arc::new(
        TestConfigProvider::minimal().with("saml.key_manager.public_key_pem_location", Value::from("missing.pem")),
    );
    let mut builder = builder_with(provider);
    builder.register_component(keys).unwrap();
    let pipeline = builder.build().await.unwrap();

    assert_eq!(pipeline.components().key_manager.default_key(), "explicit");
    assert_eq!(pipeline.describe().key_fingerprints["explicit"], SP_FINGERPRINT);
}

#[tokio::test]
async fn test_dsl_instance_replaces_resolution() {
    let mut builder = minimal_builder();
    builder.processor(|processor| {
        processor.processor(SamlProcessor {
            bindings: vec![Binding::Post],
        });
    });
    builder.web_sso_profile_consumer(|consumer| {
        consumer.response_skew(5u64);
    });
    let pipeline = builder.build().await.unwrap();

    let components = pipeline.components();
    assert_eq!(components.processor.bindings, vec![Binding::Post]);
    let consumer: &WebSsoProfileConsumer = &components.web_sso_consumer;
    assert_eq!(consumer.settings.response_skew, 5);
}

#[tokio::test]
async fn test_dsl_call_order_does_not_matter() {
    let mut first = minimal_builder();
    first
        .sso(|sso| {
            sso.sso_login_url("/login").enable_sso_hok(false);
        })
        .logout(|logout| {
            logout.logout_url("/signout");
        })
        .metadata_generator(|generator| {
            generator.metadata_url("/md");
        });

    let mut second = minimal_builder();
    second
        .metadata_generator(|generator| {
            generator.metadata_url("/md");
        })
        .logout(|logout| {
            logout.logout_url("/signout");
        })
        .sso(|sso| {
            sso.enable_sso_hok(false);
        })
        .sso(|sso| {
            sso.sso_login_url("/login");
        });

    let first = first.build().await.unwrap().describe();
    let second = second.build().await.unwrap().describe();
    assert_eq!(first, second);
    assert_eq!(first.endpoints[&Endpoint::Metadata], "/md");
}

#[tokio::test]
async fn test_builds_are_deterministic() {
    let a = minimal_builder().build().await.unwrap();
    let b = minimal_builder().build().await.unwrap();

    assert_ne!(a.build_id(), b.build_id());
    assert_eq!(a.describe(), b.describe());
    assert_eq!(a.chain().names(), b.chain().names());
    assert_eq!(a.matcher().patterns(), b.matcher().patterns());
}

#[tokio::test]
async fn test_invalid_endpoint_pattern() {
    let mut builder = minimal_builder();
    builder.sso(|sso| {
        sso.sso_processing_url("not-a-path");
    });
    let err = builder.build().await.unwrap_err();
    assert!(matches!(err, BuildError::InvalidPattern { .. }));
}

#[tokio::test]
async fn test_absolute_landing_urls() {
    let provider = Arc::new(
        TestConfigProvider::minimal().with("saml.sso.default_success_url", Value::from("https://app.example.com/home")),
    );
    let mut builder = builder_with(provider);
    builder.logout(|logout| {
        logout.default_target_url("https://app.example.com/bye");
    });
    let pipeline = builder.build().await.unwrap();

    assert_eq!(
        pipeline.endpoint(Endpoint::DefaultSuccess).as_deref(),
        Some("https://app.example.com/home")
    );
    assert_eq!(
        pipeline.endpoint(Endpoint::LogoutTarget).as_deref(),
        Some("https://app.example.com/bye")
    );
    let patterns = pipeline.matcher().patterns();
    assert!(!patterns.iter().any(|p| p.starts_with("https://")));
    assert_eq!(pipeline.authorize("/home"), Access::Authenticate);
}

#[tokio::test]
async fn test_missing_entity_id() {
    let provider = Arc::new(
        TestConfigProvider::new()
            .with("saml.key_manager.public_key_pem_location", Value::from("sp-cert.pem"))
            .with("saml.key_manager.private_key_der_location", Value::from("sp-key.der"))
            .with("saml.metadata_manager.metadata_locations", Value::from(vec!["idp-metadata.xml"])),
    );

    match builder_with(provider).build().await {
        Err(BuildError::MissingValue { facet, attribute }) => {
            assert_eq!(facet, "MetadataGenerator");
            assert_eq!(attribute, "entity_id");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
