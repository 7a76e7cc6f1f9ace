use secrecy::SecretString;

/// `SecurityContext` encapsulates the authenticated identity for a request.
///
/// Built once by the authentication middleware and carried through the
/// request lifecycle as an extension; never mutated afterward.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    /// Subject ID — the authenticated caller (JWT `sub`).
    subject_id: String,
    /// Subject's home tenant (JWT `tid`). Empty for anonymous contexts.
    tenant_id: String,
    /// Role claim strings from the inbound credential. Absence of any
    /// role claim is represented as an empty set, not an error.
    #[serde(default)]
    roles: Vec<String>,
    /// Original bearer token for the on-behalf-of exchange. Never
    /// serialized; `SecretString` redacts it from `Debug` output.
    #[serde(skip)]
    bearer_token: Option<SecretString>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder.
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// An anonymous context with no subject, tenant, or roles.
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Whether the credential carried the given role claim.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The original bearer token, for use as the exchange assertion.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<String>,
    tenant_id: Option<String>,
    roles: Vec<String>,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
            tenant_id: self.tenant_id.unwrap_or_default(),
            roles: self.roles,
            bearer_token: self.bearer_token,
        }
    }
}
