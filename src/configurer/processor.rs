// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;

use super::{BuildContext, Facet, Resolver, dsl_setters, stage};
use crate::error::BuildError;
use crate::saml::{Binding, SamlProcessor};

/// Binding toggles; every binding is enabled by default.
#[derive(Debug, Default)]
pub struct ProcessorConfigurer {
    instance: Option<SamlProcessor>,
    redirect: Option<bool>,
    post: Option<bool>,
    artifact: Option<bool>,
    soap: Option<bool>,
    paos: Option<bool>,
}

impl ProcessorConfigurer {
    const SECTION: &'static str = "processor";

    pub fn processor(&mut self, processor: SamlProcessor) -> &mut Self {
        self.instance = Some(processor);
        self
    }

    dsl_setters! {
        redirect: bool,
        post: bool,
        artifact: bool,
        soap: bool,
        paos: bool,
    }

    fn toggle(&self, binding: Binding) -> Option<bool> {
        match binding {
            Binding::Redirect => self.redirect,
            Binding::Post => self.post,
            Binding::Artifact => self.artifact,
            Binding::Soap => self.soap,
            Binding::Paos => self.paos,
        }
    }
}

#[async_trait]
impl Facet for ProcessorConfigurer {
    type Artifact = SamlProcessor;

    const NAME: &'static str = "Processor";
    const STAGE: u32 = stage::PROCESSOR;

    fn take_instance(&mut self) -> Option<SamlProcessor> {
        self.instance.take()
    }

    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<SamlProcessor, BuildError> {
        let r = Resolver::new(Self::NAME, Self::SECTION, ctx.properties);

        let mut bindings = Vec::new();
        for binding in Binding::ALL {
            if r.or_default(self.toggle(binding), binding.name(), || true)? {
                bindings.push(binding);
            }
        }

        Ok(SamlProcessor { bindings })
    }
}
