//! Security primitives for Orderhub: the per-request [`SecurityContext`]
//! and the two-tier role policy evaluator.

pub mod context;
pub mod policy;

pub use context::{SecurityContext, SecurityContextBuilder};
pub use policy::{AuthorizationDecision, PolicyTier, RoleConfig, RoleConfigError, RolePolicy};
