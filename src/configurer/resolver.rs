// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::de::DeserializeOwned;

use crate::config::SamlProperties;
use crate::error::BuildError;
use crate::trace_fmt;

/// Per-attribute precedence between a DSL value and a property default.
///
/// The property is only read when the DSL value is absent.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    facet: &'static str,
    section: &'a str,
    properties: &'a SamlProperties,
}

impl<'a> Resolver<'a> {
    pub fn new(facet: &'static str, section: &'a str, properties: &'a SamlProperties) -> Self {
        Self {
            facet,
            section,
            properties,
        }
    }

    /// DSL value, else `saml.<section>.<field>`, else nothing.
    pub fn optional<T: DeserializeOwned>(&self, dsl: Option<T>, field: &str) -> Result<Option<T>, BuildError> {
        if dsl.is_some() {
            trace_fmt!(self.facet, "{} set through the DSL", field);
            return Ok(dsl);
        }

        let value = self.properties.get(self.section, field)?;
        if value.is_some() {
            trace_fmt!(self.facet, "{} read from {}", field, self.properties.key(self.section, field));
        }
        Ok(value)
    }

    /// DSL value, else property, else the documented default.
    pub fn or_default<T: DeserializeOwned>(
        &self,
        dsl: Option<T>,
        field: &str,
        default: impl FnOnce() -> T,
    ) -> Result<T, BuildError> {
        Ok(self.optional(dsl, field)?.unwrap_or_else(default))
    }

    /// DSL value, else property; absent from both is a build error.
    pub fn required<T: DeserializeOwned>(&self, dsl: Option<T>, field: &str) -> Result<T, BuildError> {
        self.optional(dsl, field)?
            .ok_or_else(|| BuildError::missing(self.facet, field))
    }
}
