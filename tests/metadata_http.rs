// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata documents fetched over HTTP during the build.

use samlsp::error::{BuildError, ResourceError};
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{IDP_ENTITY_ID, TestConfigProvider, builder_with, fixtures_dir};

fn provider_for(location: &str) -> Arc<TestConfigProvider> {
    Arc::new(
        TestConfigProvider::minimal().with(
            "saml.metadata_manager.metadata_locations",
            Value::from(vec![location.to_string()]),
        ),
    )
}

#[tokio::test]
async fn test_remote_metadata_location() {
    let server = MockServer::start().await;
    let document = std::fs::read_to_string(fixtures_dir().join("idp-metadata.xml")).unwrap();
    Mock::given(method("GET"))
        .and(path("/idp/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_string(document))
        .expect(1)
        .mount(&server)
        .await;

    let location = format!("{}/idp/metadata", server.uri());
    let mut builder = builder_with(provider_for(&location));
    builder.metadata_manager(|metadata| {
        metadata.default_idp(IDP_ENTITY_ID);
    });
    let pipeline = builder.build().await.unwrap();

    let metadata = &pipeline.components().metadata;
    assert_eq!(metadata.locations(), vec![location.as_str()]);
    assert_eq!(metadata.idp_entity_ids(), vec![IDP_ENTITY_ID]);
    assert_eq!(metadata.default_idp.as_deref(), Some(IDP_ENTITY_ID));
}

#[tokio::test]
async fn test_remote_metadata_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let location = format!("{}/missing", server.uri());
    match builder_with(provider_for(&location)).build().await {
        Err(BuildError::Resource {
            location: failed,
            source: ResourceError::Status(status),
        }) => {
            assert_eq!(failed, location);
            assert_eq!(status, 404);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_default_idp_fails_init() {
    let mut builder = builder_with(provider_for("idp-metadata.xml"));
    builder.metadata_manager(|metadata| {
        metadata.default_idp("https://unknown.example.com");
    });

    match builder.build().await {
        Err(BuildError::Initialization { component, .. }) => assert_eq!(component, "MetadataManager"),
        other => panic!("unexpected result: {other:?}"),
    }
}
