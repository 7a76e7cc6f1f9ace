//! Claims carried by inbound bearer tokens.

use orderhub_security::SecurityContext;
use serde::Deserialize;

/// The subset of JWT claims this service reads.
///
/// `roles` is the recognized role claim; a token without it is treated
/// as carrying no roles, not as malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub sub: String,
    /// Tenant identifier.
    #[serde(default)]
    pub tid: Option<String>,
    /// Role claim strings; absent means no roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Build the request's `SecurityContext`, keeping the raw bearer
    /// token for a later on-behalf-of exchange.
    #[must_use]
    pub fn into_security_context(self, bearer_token: &str) -> SecurityContext {
        SecurityContext::builder()
            .subject_id(self.sub)
            .tenant_id(self.tid.unwrap_or_default())
            .roles(self.roles)
            .bearer_token(bearer_token.to_owned())
            .build()
    }
}
