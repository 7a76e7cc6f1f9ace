//! Two-tier role policy evaluation.
//!
//! Two named role sets come from configuration: `standard_roles` and
//! `elevated_roles`. The standard tier requires any of the standard
//! roles; the elevated tier requires any role from the union of both
//! sets (the lists are concatenated into a single require-any-of check,
//! so holding an elevated role also satisfies the combined tier).
//!
//! Evaluation fails closed: an empty required set denies every
//! principal, and [`RoleConfig::validate`] surfaces the same condition
//! as a startup configuration error so a misconfigured process never
//! serves traffic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::SecurityContext;

/// The named policy a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyTier {
    /// Requires any of the configured standard roles.
    Standard,
    /// Requires any role from the union of standard and elevated roles.
    Elevated,
}

/// Outcome of evaluating a principal against a required role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Granted,
    Denied,
}

/// Role lists loaded from external configuration at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    #[serde(default)]
    pub standard_roles: Vec<String>,
    #[serde(default)]
    pub elevated_roles: Vec<String>,
}

impl RoleConfig {
    /// Reject configurations that would leave a policy with an empty
    /// required-role set.
    ///
    /// # Errors
    ///
    /// Returns [`RoleConfigError`] naming the first empty set found.
    /// Blank entries count as empty; "allow all" is never inferred.
    pub fn validate(&self) -> Result<(), RoleConfigError> {
        if !has_non_blank(&self.standard_roles) {
            return Err(RoleConfigError::EmptyRoleSet {
                set: "standard_roles",
            });
        }
        if !has_non_blank(&self.elevated_roles) {
            return Err(RoleConfigError::EmptyRoleSet {
                set: "elevated_roles",
            });
        }
        Ok(())
    }
}

fn has_non_blank(roles: &[String]) -> bool {
    roles.iter().any(|r| !r.trim().is_empty())
}

/// A policy's required-role set is empty, which would deny everyone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleConfigError {
    #[error("required role set '{set}' is empty; refusing to start with a policy that denies all")]
    EmptyRoleSet { set: &'static str },
}

/// Evaluates principals against the configured role sets.
///
/// Stateless after construction; safe to share freely across requests.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    standard_roles: Vec<String>,
    elevated_roles: Vec<String>,
}

impl RolePolicy {
    /// Build an evaluator from configuration.
    ///
    /// Construction does not validate the sets; an empty set simply
    /// denies everyone at evaluation time. Callers that load the config
    /// from the outside world are expected to run
    /// [`RoleConfig::validate`] at startup so the misconfiguration
    /// aborts the process instead of surfacing per request.
    #[must_use]
    pub fn new(config: RoleConfig) -> Self {
        Self {
            standard_roles: config.standard_roles,
            elevated_roles: config.elevated_roles,
        }
    }

    /// Evaluate a principal's role claims against a policy tier.
    ///
    /// A principal satisfies a tier when its role set intersects the
    /// tier's required set (any listed role suffices). An empty
    /// required set denies unconditionally.
    #[must_use]
    pub fn evaluate(&self, ctx: &SecurityContext, tier: PolicyTier) -> AuthorizationDecision {
        let granted = match tier {
            PolicyTier::Standard => self.matches_any(ctx, &self.standard_roles),
            PolicyTier::Elevated => {
                // Union check: the standard and elevated lists form one
                // concatenated require-any-of set.
                self.matches_any(ctx, &self.standard_roles)
                    || self.matches_any(ctx, &self.elevated_roles)
            }
        };

        if granted {
            AuthorizationDecision::Granted
        } else {
            tracing::debug!(
                subject = %ctx.subject_id(),
                tier = ?tier,
                "role policy denied principal"
            );
            AuthorizationDecision::Denied
        }
    }

    fn matches_any(&self, ctx: &SecurityContext, required: &[String]) -> bool {
        required.iter().any(|role| ctx.has_role(role))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy(standard: &[&str], elevated: &[&str]) -> RolePolicy {
        RolePolicy::new(RoleConfig {
            standard_roles: standard.iter().map(|s| (*s).to_owned()).collect(),
            elevated_roles: elevated.iter().map(|s| (*s).to_owned()).collect(),
        })
    }

    fn principal_with(roles: &[&str]) -> SecurityContext {
        SecurityContext::builder()
            .subject_id("subject")
            .tenant_id("tenant")
            .roles(roles.iter().map(|s| (*s).to_owned()).collect())
            .build()
    }

    #[test]
    fn standard_role_satisfies_standard_tier() {
        let policy = policy(&["Reader"], &["DbAdmin"]);
        let ctx = principal_with(&["Reader"]);
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Standard),
            AuthorizationDecision::Granted
        );
    }

    #[test]
    fn elevated_only_principal_satisfies_union_tier() {
        // standard = {Reader}, elevated = {DbAdmin}, principal = {DbAdmin}
        // -> the standard-or-elevated check grants
        let policy = policy(&["Reader"], &["DbAdmin"]);
        let ctx = principal_with(&["DbAdmin"]);
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Elevated),
            AuthorizationDecision::Granted
        );
    }

    #[test]
    fn standard_only_principal_satisfies_union_tier() {
        let policy = policy(&["Reader"], &["DbAdmin"]);
        let ctx = principal_with(&["Reader"]);
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Elevated),
            AuthorizationDecision::Granted
        );
    }

    #[test]
    fn unmatched_principal_is_denied_on_both_tiers() {
        let policy = policy(&["Reader"], &["DbAdmin"]);
        let ctx = principal_with(&["Visitor"]);
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Standard),
            AuthorizationDecision::Denied
        );
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Elevated),
            AuthorizationDecision::Denied
        );
    }

    #[test]
    fn roleless_principal_is_denied() {
        let policy = policy(&["Reader"], &["DbAdmin"]);
        let ctx = principal_with(&[]);
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Standard),
            AuthorizationDecision::Denied
        );
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Elevated),
            AuthorizationDecision::Denied
        );
    }

    #[test]
    fn empty_standard_roles_fail_validation() {
        let err = RoleConfig {
            standard_roles: vec![],
            elevated_roles: vec!["DbAdmin".to_owned()],
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            RoleConfigError::EmptyRoleSet {
                set: "standard_roles"
            }
        );
    }

    #[test]
    fn empty_elevated_roles_fail_validation() {
        let err = RoleConfig {
            standard_roles: vec!["Reader".to_owned()],
            elevated_roles: vec![],
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            RoleConfigError::EmptyRoleSet {
                set: "elevated_roles"
            }
        );
    }

    #[test]
    fn blank_role_entries_count_as_empty() {
        let err = RoleConfig {
            standard_roles: vec!["  ".to_owned()],
            elevated_roles: vec!["DbAdmin".to_owned()],
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, RoleConfigError::EmptyRoleSet { .. }));
    }

    #[test]
    fn empty_required_sets_deny_every_principal() {
        let policy = RolePolicy::new(RoleConfig::default());
        let ctx = principal_with(&["Reader", "DbAdmin"]);
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Standard),
            AuthorizationDecision::Denied
        );
        assert_eq!(
            policy.evaluate(&ctx, PolicyTier::Elevated),
            AuthorizationDecision::Denied
        );
    }
}
