// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic three-tier unit shared by every built-in facet.
//!
//! 1. an explicit component already in the store at `init` wins outright; it
//!    is left untouched and only its endpoints are claimed;
//! 2. a DSL instance (or DSL field) comes next;
//! 3. property defaults are read last, and only for fields still unresolved.

use async_trait::async_trait;
use std::any::{Any, type_name};
use std::fmt;

use super::{ArtifactType, BuildContext, Configurer};
use crate::endpoints::Endpoint;
use crate::error::BuildError;
use crate::{debug_fmt, trace_fmt};

/// The facet-specific half of a unit: DSL state plus resolution rules.
#[async_trait]
pub trait Facet: fmt::Debug + Default + Send + Sync + 'static {
    type Artifact: Any + Send + Sync;

    const NAME: &'static str;
    const STAGE: u32;

    fn requires() -> Vec<ArtifactType> {
        Vec::new()
    }

    /// A complete artifact handed over through the DSL.
    fn take_instance(&mut self) -> Option<Self::Artifact> {
        None
    }

    /// Build the artifact from DSL fields and property defaults.
    async fn resolve(&self, ctx: &BuildContext<'_>) -> Result<Self::Artifact, BuildError>;

    /// Endpoints owned by this facet, read from the final artifact.
    fn endpoints(_artifact: &Self::Artifact) -> Vec<(Endpoint, String)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum UnitState {
    #[default]
    Registered,
    Initialized,
    Configured,
}

/// Adapts a [`Facet`] to the [`Configurer`] lifecycle.
#[derive(Debug, Default)]
pub struct FacetUnit<F> {
    facet: F,
    state: UnitState,
    explicit: bool,
}

impl<F: Facet> FacetUnit<F> {
    pub fn new(facet: F) -> Self {
        Self {
            facet,
            state: UnitState::Registered,
            explicit: false,
        }
    }

    pub fn facet(&self) -> &F {
        &self.facet
    }

    pub fn facet_mut(&mut self) -> &mut F {
        &mut self.facet
    }

    /// Whether `init` found an explicit component.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    fn lifecycle(message: &str) -> BuildError {
        BuildError::Lifecycle {
            unit: F::NAME.to_string(),
            message: message.to_string(),
        }
    }

    fn claim_all(ctx: &BuildContext<'_>, endpoints: Vec<(Endpoint, String)>) -> Result<(), BuildError> {
        for (endpoint, pattern) in endpoints {
            ctx.claim(endpoint, &pattern, F::NAME)?;
        }
        Ok(())
    }
}

#[async_trait]
impl<F: Facet> Configurer for FacetUnit<F> {
    fn name(&self) -> &'static str {
        F::NAME
    }

    fn rank(&self) -> u32 {
        F::STAGE
    }

    fn provides(&self) -> Vec<ArtifactType> {
        vec![ArtifactType::of::<F::Artifact>()]
    }

    fn requires(&self) -> Vec<ArtifactType> {
        F::requires()
    }

    fn init(&mut self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
        if self.state != UnitState::Registered {
            return Err(Self::lifecycle("init called more than once"));
        }

        self.explicit = ctx.store.contains::<F::Artifact>();
        if self.explicit {
            debug_fmt!(F::NAME, "Explicit {} registered, skipping resolution", type_name::<F::Artifact>());
        }
        self.state = UnitState::Initialized;
        Ok(())
    }

    async fn configure(&mut self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
        match self.state {
            UnitState::Registered => return Err(Self::lifecycle("configure called before init")),
            UnitState::Configured => return Err(Self::lifecycle("configure called more than once")),
            UnitState::Initialized => {}
        }

        if self.explicit {
            let artifact = ctx
                .store
                .get::<F::Artifact>()
                .ok_or(BuildError::MissingArtifact(type_name::<F::Artifact>()))?;
            let endpoints = F::endpoints(artifact);
            Self::claim_all(ctx, endpoints)?;
        } else {
            let artifact = match self.facet.take_instance() {
                Some(instance) => {
                    trace_fmt!(F::NAME, "Using DSL instance");
                    instance
                }
                None => self.facet.resolve(ctx).await?,
            };
            Self::claim_all(ctx, F::endpoints(&artifact))?;
            ctx.store.set(Some(artifact));
        }

        debug_fmt!(F::NAME, "Configured");
        self.state = UnitState::Configured;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
