// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::assembler::{Access, BASELINE_FILTERS, PipelineAssembler, SecurityFilterChain};
    use crate::builder::ServiceProviderBuilder;
    use crate::config::SamlProperties;
    use crate::endpoints::{AntPathMatcher, EndpointRegistry, LazyRequestMatcher};
    use crate::error::BuildError;
    use crate::logging::BuildInfo;
    use crate::resources::DefaultResourceLoader;
    use crate::saml::{
        FailureHandler, KeyManager, SamlContextProvider, SamlProcessingFilter, SecurityFilter, SuccessHandler,
    };
    use crate::store::SharedObjectStore;

    fn builder() -> ServiceProviderBuilder {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let mut builder = ServiceProviderBuilder::with_resource_loader(
            SamlProperties::default(),
            Arc::new(DefaultResourceLoader::new(fixtures)),
        );
        builder
            .key_manager(|keys| {
                keys.public_key_pem_location("sp-cert.pem")
                    .private_key_der_location("sp-key.der");
            })
            .metadata_manager(|metadata| {
                metadata.metadata_location("idp-metadata.xml");
            })
            .metadata_generator(|generator| {
                generator.entity_id("urn:test:sp");
            });
        builder
    }

    fn processing_filter(pattern: &str) -> Arc<dyn SecurityFilter> {
        Arc::new(SamlProcessingFilter::new(
            AntPathMatcher::new(pattern).unwrap(),
            false,
            SuccessHandler {
                default_target_url: "/".to_string(),
                always_use_default_target_url: false,
            },
            FailureHandler {
                default_failure_url: "/error".to_string(),
            },
        ))
    }

    #[test]
    fn test_chain_inserts_after_anchor() {
        let mut chain = SecurityFilterChain::baseline();
        assert_eq!(chain.names(), BASELINE_FILTERS);

        chain
            .add_after("basic-authentication", processing_filter("/saml/SSO"))
            .unwrap();
        assert_eq!(
            chain.names(),
            vec![
                "security-context-persistence",
                "logout",
                "basic-authentication",
                "saml-processing",
                "exception-translation",
                "authorization",
            ]
        );
        assert_eq!(chain.filter_for("/saml/SSO").unwrap().name(), "saml-processing");
        assert!(chain.filter_for("/logout").is_none());
    }

    #[test]
    fn test_chain_rejects_unknown_anchor_and_duplicates() {
        let mut chain = SecurityFilterChain::baseline();
        let err = chain.add_after("csrf", processing_filter("/a")).unwrap_err();
        assert!(matches!(err, BuildError::FilterChain(_)));

        chain.add_after("logout", processing_filter("/a")).unwrap();
        let err = chain.add_after("logout", processing_filter("/b")).unwrap_err();
        assert!(matches!(err, BuildError::FilterChain(_)));
        assert_eq!(chain.len(), BASELINE_FILTERS.len() + 1);
    }

    #[test]
    fn test_assembler_needs_every_artifact() {
        let endpoints = EndpointRegistry::shared();
        let matcher = LazyRequestMatcher::new(Arc::clone(&endpoints));
        let assembler = PipelineAssembler::new(SharedObjectStore::new(), endpoints, matcher);

        match assembler.assemble(&BuildInfo::new(), Vec::new()) {
            Err(BuildError::MissingArtifact(name)) => assert!(name.ends_with("KeyManager")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_filters_follow_stage_order() {
        let pipeline = builder().build().await.unwrap();

        assert_eq!(
            pipeline.chain().names(),
            vec![
                "security-context-persistence",
                "logout",
                "basic-authentication",
                "saml-logout",
                "saml-logout-processing",
                "saml-entry-point",
                "saml-processing",
                "saml-hok-processing",
                "saml-discovery",
                "metadata-generator",
                "metadata-display",
                "exception-translation",
                "authorization",
            ]
        );
        assert_eq!(pipeline.entry_point().name(), "saml-entry-point");
        assert_eq!(pipeline.filter_for("/saml/metadata").unwrap().name(), "metadata-display");
        assert_eq!(pipeline.filter_for("/saml/SingleLogout").unwrap().name(), "saml-logout-processing");
    }

    #[tokio::test]
    async fn test_init_hooks_run_in_stage_order() {
        let pipeline = builder().build().await.unwrap();
        let order = pipeline.init_order();

        assert_eq!(order.first(), Some(&"KeyManager"));
        assert_eq!(order.last(), Some(&"MetadataDisplayFilter"));
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        assert!(position("MetadataManager") < position("SamlContextProvider"));
        assert!(position("SamlLogoutFilter") < position("SamlEntryPoint"));
        assert!(position("SamlDiscovery") < position("MetadataGenerator"));
    }

    #[tokio::test]
    async fn test_references_injected_into_components() {
        let pipeline = builder().build().await.unwrap();
        let components = pipeline.components();

        assert!(Arc::ptr_eq(
            components.metadata.key_manager.as_ref().unwrap(),
            &components.key_manager
        ));
        assert!(Arc::ptr_eq(
            components.authentication_provider.consumer.as_ref().unwrap(),
            &components.web_sso_consumer
        ));
        assert!(Arc::ptr_eq(
            pipeline.entry_point().web_sso_profile.as_ref().unwrap(),
            &components.web_sso_profile
        ));
        assert_eq!(components.metadata.hosted_sp_name.as_deref(), Some("urn:test:sp"));
        assert_eq!(components.metadata.idp_entity_ids(), vec!["https://idp.example.com/saml"]);
    }

    #[tokio::test]
    async fn test_preset_references_are_kept() {
        let other_keys = Arc::new(KeyManager::new("other"));
        let mut context = SamlContextProvider::default();
        context.key_manager = Some(Arc::clone(&other_keys));

        let mut builder = builder();
        builder.context_provider(|provider| {
            provider.context_provider(context);
        });
        let pipeline = builder.build().await.unwrap();

        let components = pipeline.components();
        assert!(Arc::ptr_eq(components.context.key_manager.as_ref().unwrap(), &other_keys));
        assert!(components.context.metadata.is_some());
    }

    #[tokio::test]
    async fn test_access_rules() {
        let pipeline = builder().build().await.unwrap();

        assert_eq!(pipeline.authorize("/saml/login"), Access::Permit);
        assert_eq!(pipeline.authorize("/saml/SSO?SAMLResponse=abc"), Access::Permit);
        assert_eq!(pipeline.authorize("/error"), Access::Permit);
        assert_eq!(pipeline.authorize("/"), Access::Authenticate);
        assert_eq!(pipeline.authorize("/sanity-check"), Access::Authenticate);
        assert_eq!(pipeline.access_rules().len(), 2);
    }

    #[tokio::test]
    async fn test_description() {
        let pipeline = builder().build().await.unwrap();
        let description = pipeline.describe();

        assert_eq!(description.entity_id, "urn:test:sp");
        assert_eq!(description.entry_point_url, "/saml/login");
        assert_eq!(description.metadata_locations, vec!["idp-metadata.xml"]);
        assert!(description.key_fingerprints.contains_key("localhost"));
        assert!(!description.public_patterns.contains(&"/".to_string()));

        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(json["endpoints"]["sso_processing"], "/saml/SSO");
        assert_eq!(json["filters"][3], "saml-logout");
    }
}
