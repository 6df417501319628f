// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{ArtifactType, BuildContext, Facet, Resolver, stage};
use crate::error::BuildError;
use crate::info_fmt;
use crate::saml::{ContextProviderKind, KeyManager, LoadBalancerSettings, MetadataManager, SamlContextProvider};

/// Plain or load-balancer aware context provider, picked by `lb.enabled`.
#[derive(Debug, Default)]
pub struct ContextProviderConfigurer {
    instance: Option<SamlContextProvider>,
    lb_enabled: Option<bool>,
    lb_scheme: Option<String>,
    lb_server_name: Option<String>,
    lb_server_port: Option<u16>,
    lb_include_server_port_in_request_url: Option<bool>,
    lb_context_path: Option<String>,
}

impl ContextProviderConfigurer {
    const SECTION: &'static str = "context_provider";

    pub fn context_provider(&mut self, provider: SamlContextProvider) -> &mut Self {
        self.instance = Some(provider);
        self
    }

    /// Switch to the load-balanced variant.
    pub fn load_balanced(&mut self, enabled: bool) -> &mut Self {
        self.lb_enabled = Some(enabled);
        self
    }

    pub fn scheme(&mut self, scheme: impl Into<String>) -> &mut Self {
        self.lb_scheme = Some(scheme.into());
        self
    }

    pub fn server_name(&mut self, server_name: impl Into<String>) -> &mut Self {
        self.lb_server_name = Some(server_name.into());
        self
    }

    pub fn server_port(&mut self, port: u16) -> &mut Self {
        self.lb_server_port = Some(port);
        self
    }

    pub fn include_server_port_in_request_url(&mut self, include: bool) -> &mut Self {
        self.lb_include_server_port_in_request_url = Some(include);
        self
    }

    pub fn context_path(&mut self, context_path: impl Into<String>) -> &mut Self {
        self.lb_context_path = Some(context_path.into());
        self
    }

    fn load_balancer(&self, r: &Resolver<'_>) -> Result<LoadBalancerSettings, BuildError> {
        let d = LoadBalancerSettings::default();
        Ok(LoadBalancerSettings {
            scheme: r.or_default(self.lb_scheme.clone(), "lb.scheme", || d.scheme)?,
            server_name: r.or_default(self.lb_server_name.clone(), "lb.server_name", || d.server_name)?,
            server_port: r.or_default(self.lb_server_port, "lb.server_port", || d.server_port)?,
            include_server_port_in_request_url: r.or_default(
                self.lb_include_server_port_in_request_url,
                "lb.include_server_port_in_request_url",
                || d.include_server_port_in_request_url,
            )?,
            context_path: r.or_default(self.lb_context_path.clone(), "lb.context_path", || d.context_path)?,
        })
    }
}

#[async_trait]
impl Facet for ContextProviderConfigurer {
    type Artifact = SamlContextProvider;

    const NAME: &'static str = "ContextProvider";
    const STAGE: u32 = stage::CONTEXT_PROVIDER;

    fn requires() -> Vec<ArtifactType> {
        vec![ArtifactType::of::<KeyManager>(), ArtifactType::of::<MetadataManager>()]
    }

    fn take_instance(&mut self) -> Option<SamlContextProvider> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<SamlContextProvider, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        let kind = if r.or_default(self.lb_enabled, "lb.enabled", || false)? {
            let lb = self.load_balancer(&r)?;
            info_fmt!(Self::NAME, "Load-balanced context at {}", lb.base_url());
            ContextProviderKind::LoadBalanced(lb)
        } else {
            ContextProviderKind::Default
        };

        Ok(SamlContextProvider::new(kind))
    }
}
