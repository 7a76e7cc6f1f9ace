//! Per-route policy tiers, matched with `matchit`.

use std::collections::HashMap;

use http::Method;
use orderhub_security::PolicyTier;
use thiserror::Error;

/// Maps `(method, path)` to the policy tier a route requires.
///
/// Routes are registered with matchit's `{param}` syntax (the same
/// syntax axum 0.8 uses). A route absent from the policy is public:
/// the middleware inserts an anonymous context and lets it through.
#[derive(Default)]
pub struct RouteTierPolicy {
    matchers: HashMap<Method, matchit::Router<PolicyTier>>,
}

/// A route pattern could not be registered.
#[derive(Error, Debug)]
#[error("failed to register route pattern '{pattern}': {source}")]
pub struct RoutePolicyError {
    pattern: String,
    #[source]
    source: matchit::InsertError,
}

impl RouteTierPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `tier` for requests matching `method` + `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutePolicyError`] when the pattern conflicts with an
    /// already-registered one.
    pub fn require(
        mut self,
        method: Method,
        pattern: &str,
        tier: PolicyTier,
    ) -> Result<Self, RoutePolicyError> {
        self.matchers
            .entry(method)
            .or_default()
            .insert(pattern, tier)
            .map_err(|source| RoutePolicyError {
                pattern: pattern.to_owned(),
                source,
            })?;
        Ok(self)
    }

    /// Resolve the tier required for a concrete request path.
    /// `None` means the route is public.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<PolicyTier> {
        self.matchers
            .get(method)
            .and_then(|router| router.at(path).ok())
            .map(|matched| *matched.value)
    }
}
