// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::sync::Arc;

use crate::error::BuildError;
use crate::saml::SecurityFilter;

/// Filters the host framework installs before any SAML filter is added.
pub const BASELINE_FILTERS: [&str; 5] = [
    "security-context-persistence",
    "logout",
    "basic-authentication",
    "exception-translation",
    "authorization",
];

/// SAML filters are inserted after this baseline filter.
pub const ANCHOR_FILTER: &str = "basic-authentication";

#[derive(Clone)]
enum Link {
    Baseline(String),
    Saml(Arc<dyn SecurityFilter>),
}

impl Link {
    fn name(&self) -> &str {
        match self {
            Link::Baseline(name) => name,
            Link::Saml(filter) => filter.name(),
        }
    }
}

/// Ordered request filter chain.
#[derive(Clone, Default)]
pub struct SecurityFilterChain {
    links: Vec<Link>,
}

impl fmt::Debug for SecurityFilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl SecurityFilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain holding only the framework's baseline filters.
    pub fn baseline() -> Self {
        Self {
            links: BASELINE_FILTERS
                .iter()
                .map(|name| Link::Baseline(name.to_string()))
                .collect(),
        }
    }

    /// Insert `filter` directly after the filter named `after`.
    pub fn add_after(&mut self, after: &str, filter: Arc<dyn SecurityFilter>) -> Result<(), BuildError> {
        if self.position(filter.name()).is_some() {
            return Err(BuildError::FilterChain(format!("filter '{}' is already in the chain", filter.name())));
        }
        let index = self
            .position(after)
            .ok_or_else(|| BuildError::FilterChain(format!("no filter named '{after}' in the chain")))?;

        self.links.insert(index + 1, Link::Saml(filter));
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.links.iter().position(|link| link.name() == name)
    }

    /// Filter names in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(Link::name).collect()
    }

    /// SAML filters in chain order.
    pub fn saml_filters(&self) -> impl Iterator<Item = &Arc<dyn SecurityFilter>> {
        self.links.iter().filter_map(|link| match link {
            Link::Saml(filter) => Some(filter),
            Link::Baseline(_) => None,
        })
    }

    /// First SAML filter bound to a URL matching `path`.
    pub fn filter_for(&self, path: &str) -> Option<&Arc<dyn SecurityFilter>> {
        self.saml_filters()
            .find(|filter| filter.processing_url().is_some_and(|url| url.matches(path)))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
