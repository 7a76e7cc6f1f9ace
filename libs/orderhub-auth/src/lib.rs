//! Authentication, route authorization, and the delegated token broker.
//!
//! The flow per request: the [`middleware::AuthLayer`] resolves the route's
//! required [`orderhub_security::PolicyTier`], validates the inbound bearer
//! credential via a [`validator::TokenValidator`], evaluates the role
//! policy, and stores the resulting `SecurityContext` as a request
//! extension. Routes that call a downstream service then use the
//! [`broker::TokenBroker`] to trade the caller's credential for one scoped
//! to that service.

pub mod broker;
pub mod claims;
pub mod errors;
pub mod middleware;
pub mod route_policy;
pub mod validator;

pub use broker::{BrokerError, BrokerSettings, DelegatedToken, TokenBroker};
pub use claims::Claims;
pub use errors::AuthError;
pub use middleware::{AuthLayer, Authz};
pub use route_policy::RouteTierPolicy;
pub use validator::{JwtConfig, JwtValidator, StaticTokenValidator, TokenValidator};
