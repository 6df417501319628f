// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ant-style path matchers.
//!
//! | token    | matches                                   |
//! |----------|-------------------------------------------|
//! | `?`      | one character inside a segment            |
//! | `*`      | any run of characters inside a segment    |
//! | `**`     | zero or more whole segments               |
//! | `{name}` | one non-empty segment                     |

use once_cell::sync::OnceCell;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use super::{SharedEndpoints, read_registry};
use crate::error::BuildError;
use crate::trace_fmt;

/// A compiled Ant-style path pattern.
#[derive(Clone)]
pub struct AntPathMatcher {
    pattern: String,
    regex: Regex,
}

impl fmt::Debug for AntPathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AntPathMatcher").field(&self.pattern).finish()
    }
}

impl PartialEq for AntPathMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl AntPathMatcher {
    pub fn new(pattern: &str) -> Result<Self, BuildError> {
        let regex_pattern = Self::pattern_to_regex(pattern)?;
        let regex = Regex::new(&regex_pattern).map_err(|e| BuildError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match a request path. Anything after `?` is ignored.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or_default();
        self.regex.is_match(path)
    }

    fn pattern_to_regex(pattern: &str) -> Result<String, BuildError> {
        let invalid = |reason: &str| BuildError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let Some(rest) = pattern.strip_prefix('/') else {
            return Err(invalid("pattern must start with '/'"));
        };

        let mut regex_pattern = "^".to_string();
        for segment in rest.split('/') {
            if segment == "**" {
                regex_pattern.push_str("(?:/.*)?");
                continue;
            }

            regex_pattern.push('/');
            let mut chars = segment.chars();
            while let Some(c) = chars.next() {
                match c {
                    '*' => regex_pattern.push_str("[^/]*"),
                    '?' => regex_pattern.push_str("[^/]"),
                    '{' => {
                        if !chars.by_ref().any(|next| next == '}') {
                            return Err(invalid("unterminated '{' variable"));
                        }
                        regex_pattern.push_str("[^/]+");
                    }
                    _ => regex_pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
                }
            }
        }

        regex_pattern.push('$');
        Ok(regex_pattern)
    }
}

/// Disjunction of path matchers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrRequestMatcher {
    matchers: Vec<AntPathMatcher>,
}

impl OrRequestMatcher {
    pub fn new(matchers: Vec<AntPathMatcher>) -> Self {
        Self { matchers }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.matchers.iter().map(AntPathMatcher::pattern).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[derive(Debug)]
struct LazyInner {
    endpoints: SharedEndpoints,
    compiled: OnceCell<OrRequestMatcher>,
}

/// Matcher over the public endpoints of a registry, compiled on first use.
///
/// Handed out before the build finishes. Until the registry is sealed every
/// query compiles a transient matcher; the first query after sealing caches
/// the result for the lifetime of the pipeline.
#[derive(Debug, Clone)]
pub struct LazyRequestMatcher {
    inner: Arc<LazyInner>,
}

impl LazyRequestMatcher {
    pub fn new(endpoints: SharedEndpoints) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                endpoints,
                compiled: OnceCell::new(),
            }),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if let Some(compiled) = self.inner.compiled.get() {
            return compiled.matches(path);
        }

        let registry = read_registry(&self.inner.endpoints);
        if !registry.is_sealed() {
            trace_fmt!("LazyRequestMatcher", "Registry not sealed yet; matching {} transiently", path);
            return registry.compile().matches(path);
        }

        self.inner
            .compiled
            .get_or_init(|| registry.compile())
            .matches(path)
    }

    /// Whether the cached matcher has been compiled.
    pub fn is_compiled(&self) -> bool {
        self.inner.compiled.get().is_some()
    }

    /// Patterns of the current matcher, in endpoint order.
    pub fn patterns(&self) -> Vec<String> {
        match self.inner.compiled.get() {
            Some(compiled) => compiled.patterns().into_iter().map(str::to_string).collect(),
            None => read_registry(&self.inner.endpoints)
                .compile()
                .patterns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
