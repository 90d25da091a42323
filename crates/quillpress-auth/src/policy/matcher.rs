//! Route pattern matching for authorization checks.
//!
//! Two kinds of pattern appear in the policy table:
//!
//! - **Literal** patterns (`/admin`) authorize the exact path and any nested
//!   sub-route under it (`/admin/reports`).
//! - **Templated** patterns (`/article/edit/:id`) contain `:name` segments.
//!   Each placeholder matches exactly one non-empty path segment and the
//!   whole pattern is anchored, so `/article/edit` and
//!   `/article/edit/123/history` are both rejected.
//!
//! The two behave differently on purpose: literal entries grant whole areas,
//! templated entries grant a single resource route. Templated patterns do not
//! get the nested-prefix extension.
//!
//! Paths are not normalized here. Callers strip trailing slashes and query
//! strings before asking.
//!
//! # Usage
//!
//! ```
//! use quillpress_auth::policy::matcher::{RouteMatcher, matches};
//!
//! assert!(matches("/article/edit/:id", "/article/edit/123"));
//! assert!(!matches("/article/edit/:id", "/article/edit/123/extra"));
//!
//! let matcher = RouteMatcher::new();
//! assert!(matcher.matches("/admin", "/admin/reports"));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use regex::Regex;

use crate::AuthResult;
use crate::error::AuthError;
use crate::types::PermissionSet;

// =============================================================================
// Route Pattern
// =============================================================================

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub enum RoutePattern {
    /// Pattern without placeholders; matches the path and its sub-routes.
    Literal(String),
    /// Pattern with `:name` placeholders; matches the full path only.
    Template {
        /// Pattern as written in the policy table.
        source: String,
        /// Anchored regex with one capture group per placeholder.
        regex: Regex,
        /// Placeholder names in order of appearance.
        params: Vec<String>,
    },
}

impl RoutePattern {
    /// Compiles a route pattern.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidPattern`] if a placeholder has no name.
    pub fn parse(pattern: &str) -> AuthResult<Self> {
        if !pattern.split('/').any(|segment| segment.starts_with(':')) {
            return Ok(Self::Literal(pattern.to_string()));
        }

        let mut params = Vec::new();
        let mut parts = Vec::new();
        for segment in pattern.split('/') {
            match segment.strip_prefix(':') {
                Some("") => {
                    return Err(AuthError::invalid_pattern(pattern, "placeholder without a name"));
                }
                Some(name) => {
                    params.push(name.to_string());
                    parts.push("([^/]+)".to_string());
                }
                None => parts.push(regex::escape(segment)),
            }
        }

        let regex = Regex::new(&format!("^{}$", parts.join("/")))
            .map_err(|e| AuthError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self::Template {
            source: pattern.to_string(),
            regex,
            params,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(source) => source,
            Self::Template { source, .. } => source,
        }
    }

    /// Returns `true` if the pattern contains placeholders.
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template { .. })
    }

    /// Tests `path` against this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            // An empty literal only ever grants the empty path.
            Self::Literal(literal) if literal.is_empty() => path.is_empty(),
            Self::Literal(literal) => {
                path == literal
                    || path
                        .strip_prefix(literal.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Template { regex, .. } => regex.is_match(path),
        }
    }

    /// Extracts placeholder values from `path`.
    ///
    /// Returns `None` if the path does not match. Literal patterns yield an
    /// empty list on match.
    #[must_use]
    pub fn extract_params(&self, path: &str) -> Option<Vec<(String, String)>> {
        match self {
            Self::Literal(_) => self.matches(path).then(Vec::new),
            Self::Template { regex, params, .. } => {
                let captures = regex.captures(path)?;
                Some(
                    params
                        .iter()
                        .zip(captures.iter().skip(1))
                        .filter_map(|(name, value)| {
                            value.map(|v| (name.clone(), v.as_str().to_string()))
                        })
                        .collect(),
                )
            }
        }
    }
}

// =============================================================================
// Free functions
// =============================================================================

/// Tests `path` against a single pattern.
///
/// An unparsable pattern never matches.
#[must_use]
pub fn matches(pattern: &str, path: &str) -> bool {
    RoutePattern::parse(pattern).is_ok_and(|compiled| compiled.matches(path))
}

/// Returns `true` if any allowed route of `permissions` matches `path`.
#[must_use]
pub fn is_authorized(permissions: &PermissionSet, path: &str) -> bool {
    permissions
        .allowed_routes
        .iter()
        .any(|pattern| matches(pattern, path))
}

// =============================================================================
// Route Matcher
// =============================================================================

/// Route matcher with a compiled-pattern cache.
///
/// The policy table is small and static, so every pattern is compiled once
/// and reused. This struct is thread-safe and can be shared across callers.
pub struct RouteMatcher {
    compiled: RwLock<HashMap<String, Arc<RoutePattern>>>,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteMatcher {
    /// Create a new route matcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Tests `path` against a single pattern.
    #[must_use]
    pub fn matches(&self, pattern: &str, path: &str) -> bool {
        self.get_or_compile(pattern)
            .is_some_and(|compiled| compiled.matches(path))
    }

    /// Returns `true` if any allowed route of `permissions` matches `path`.
    #[must_use]
    pub fn is_authorized(&self, permissions: &PermissionSet, path: &str) -> bool {
        self.first_match(permissions, path).is_some()
    }

    /// Returns the first allowed route of `permissions` that matches `path`.
    #[must_use]
    pub fn first_match<'a>(&self, permissions: &'a PermissionSet, path: &str) -> Option<&'a str> {
        permissions
            .allowed_routes
            .iter()
            .find(|pattern| self.matches(pattern, path))
            .map(String::as_str)
    }

    /// Number of compiled patterns held in the cache.
    #[must_use]
    pub fn cached_patterns(&self) -> usize {
        self.compiled.read().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Get a compiled pattern from cache or compile and cache it.
    fn get_or_compile(&self, pattern: &str) -> Option<Arc<RoutePattern>> {
        if let Some(compiled) = self
            .compiled
            .read()
            .ok()
            .and_then(|cache| cache.get(pattern).cloned())
        {
            return Some(compiled);
        }

        let compiled = match RoutePattern::parse(pattern) {
            Ok(compiled) => Arc::new(compiled),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "Skipping invalid route pattern");
                return None;
            }
        };
        if let Ok(mut cache) = self.compiled.write() {
            cache.insert(pattern.to_string(), Arc::clone(&compiled));
        }

        Some(compiled)
    }
}

// =============================================================================
// Tests
// =============================================================================
