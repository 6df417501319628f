// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Endpoint registry – which URL patterns the SAML pipeline owns.
//!
//! Each endpoint is claimed by exactly one configurer during `configure`.
//! The public endpoints are compiled into the [`LazyRequestMatcher`] that the
//! assembled pipeline registers as "permit without authentication". The two
//! landing pages are kept as given, either a path or an absolute http(s) URL,
//! and never matched.
//!
//! | endpoint          | public | owner                 |
//! |-------------------|--------|-----------------------|
//! | `SsoProcessing`   | yes    | SSO                   |
//! | `SsoHokProcessing`| yes    | SSO (if HoK enabled)  |
//! | `Discovery`       | yes    | SSO (if enabled)      |
//! | `IdpSelection`    | yes    | SSO (if enabled)      |
//! | `Login`           | yes    | SSO                   |
//! | `DefaultFailure`  | yes    | SSO                   |
//! | `DefaultSuccess`  | no     | SSO                   |
//! | `Metadata`        | yes    | metadata generator    |
//! | `Logout`          | yes    | logout                |
//! | `SingleLogout`    | yes    | logout                |
//! | `LogoutTarget`    | no     | logout                |

mod matcher;


pub use matcher::{AntPathMatcher, LazyRequestMatcher, OrRequestMatcher};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::debug_fmt;
use crate::error::BuildError;

/// A named, independently overridable endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    SsoProcessing,
    SsoHokProcessing,
    Discovery,
    IdpSelection,
    Login,
    Metadata,
    Logout,
    SingleLogout,
    DefaultFailure,
    DefaultSuccess,
    LogoutTarget,
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::SsoProcessing,
        Endpoint::SsoHokProcessing,
        Endpoint::Discovery,
        Endpoint::IdpSelection,
        Endpoint::Login,
        Endpoint::Metadata,
        Endpoint::Logout,
        Endpoint::SingleLogout,
        Endpoint::DefaultFailure,
        Endpoint::DefaultSuccess,
        Endpoint::LogoutTarget,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Endpoint::SsoProcessing => "sso_processing",
            Endpoint::SsoHokProcessing => "sso_hok_processing",
            Endpoint::Discovery => "discovery",
            Endpoint::IdpSelection => "idp_selection",
            Endpoint::Login => "login",
            Endpoint::Metadata => "metadata",
            Endpoint::Logout => "logout",
            Endpoint::SingleLogout => "single_logout",
            Endpoint::DefaultFailure => "default_failure",
            Endpoint::DefaultSuccess => "default_success",
            Endpoint::LogoutTarget => "logout_target",
        }
    }

    /// Landing pages belong to the application and stay behind authentication.
    pub const fn is_public(self) -> bool {
        !matches!(self, Endpoint::DefaultSuccess | Endpoint::LogoutTarget)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
enum Target {
    /// Public endpoint, compiled for the request matcher.
    Pattern(AntPathMatcher),
    /// Landing page: a path or an absolute http(s) URL, never matched.
    Landing(String),
}

impl Target {
    fn for_endpoint(endpoint: Endpoint, value: &str) -> Result<Self, BuildError> {
        if endpoint.is_public() {
            return Ok(Target::Pattern(AntPathMatcher::new(value)?));
        }
        if value.starts_with('/') || is_absolute_http_url(value) {
            return Ok(Target::Landing(value.to_string()));
        }
        Err(BuildError::InvalidPattern {
            pattern: value.to_string(),
            reason: "landing page must be a path or an http(s) URL".to_string(),
        })
    }

    fn as_str(&self) -> &str {
        match self {
            Target::Pattern(matcher) => matcher.pattern(),
            Target::Landing(url) => url,
        }
    }
}

fn is_absolute_http_url(value: &str) -> bool {
    reqwest::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
struct Claim {
    target: Target,
    owner: String,
}

/// One URL pattern per endpoint, filled in by the owning configurers.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    claims: BTreeMap<Endpoint, Claim>,
    sealed: bool,
}

/// Registry handle shared between the builder and the lazy matcher.
pub type SharedEndpoints = Arc<RwLock<EndpointRegistry>>;

/// Read access, recovering the guard of a poisoned lock.
pub fn read_registry(endpoints: &SharedEndpoints) -> RwLockReadGuard<'_, EndpointRegistry> {
    endpoints.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access on behalf of `unit`; a poisoned lock fails the build.
pub fn write_registry<'a>(
    endpoints: &'a SharedEndpoints,
    unit: &str,
) -> Result<RwLockWriteGuard<'a, EndpointRegistry>, BuildError> {
    endpoints.write().map_err(|_| BuildError::Lifecycle {
        unit: unit.to_string(),
        message: "endpoint registry lock poisoned".to_string(),
    })
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedEndpoints {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Claim an endpoint for `owner`. Each endpoint may be claimed once.
    pub fn claim(&mut self, endpoint: Endpoint, pattern: &str, owner: &str) -> Result<(), BuildError> {
        if self.sealed {
            return Err(BuildError::Lifecycle {
                unit: owner.to_string(),
                message: format!("endpoint {endpoint} claimed after the registry was sealed"),
            });
        }
        if let Some(existing) = self.claims.get(&endpoint) {
            return Err(BuildError::EndpointConflict {
                endpoint: endpoint.to_string(),
                owner: existing.owner.clone(),
                claimant: owner.to_string(),
            });
        }

        let target = Target::for_endpoint(endpoint, pattern)?;
        debug_fmt!("EndpointRegistry", "{} claimed {} -> {}", owner, endpoint, pattern);
        self.claims.insert(
            endpoint,
            Claim {
                target,
                owner: owner.to_string(),
            },
        );
        Ok(())
    }

    pub fn get(&self, endpoint: Endpoint) -> Option<&str> {
        self.claims.get(&endpoint).map(|c| c.target.as_str())
    }

    pub fn owner(&self, endpoint: Endpoint) -> Option<&str> {
        self.claims.get(&endpoint).map(|c| c.owner.as_str())
    }

    pub fn sso_processing_url(&self) -> Option<&str> {
        self.get(Endpoint::SsoProcessing)
    }

    pub fn sso_hok_processing_url(&self) -> Option<&str> {
        self.get(Endpoint::SsoHokProcessing)
    }

    pub fn discovery_url(&self) -> Option<&str> {
        self.get(Endpoint::Discovery)
    }

    pub fn login_url(&self) -> Option<&str> {
        self.get(Endpoint::Login)
    }

    pub fn metadata_url(&self) -> Option<&str> {
        self.get(Endpoint::Metadata)
    }

    pub fn logout_url(&self) -> Option<&str> {
        self.get(Endpoint::Logout)
    }

    pub fn single_logout_url(&self) -> Option<&str> {
        self.get(Endpoint::SingleLogout)
    }

    pub fn default_failure_url(&self) -> Option<&str> {
        self.get(Endpoint::DefaultFailure)
    }

    /// Every claimed endpoint with its pattern, in endpoint order.
    pub fn entries(&self) -> Vec<(Endpoint, &str)> {
        self.claims
            .iter()
            .map(|(endpoint, claim)| (*endpoint, claim.target.as_str()))
            .collect()
    }

    /// OR matcher over every claimed public endpoint; unset fields and
    /// landing pages are skipped.
    pub fn compile(&self) -> OrRequestMatcher {
        OrRequestMatcher::new(
            self.claims
                .iter()
                .filter_map(|(_, claim)| match &claim.target {
                    Target::Pattern(matcher) => Some(matcher.clone()),
                    Target::Landing(_) => None,
                })
                .collect(),
        )
    }

    /// No further claims; the lazy matcher may cache from here on.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
