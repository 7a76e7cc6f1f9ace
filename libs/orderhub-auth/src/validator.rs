//! Inbound bearer-token validation.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use orderhub_security::SecurityContext;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::claims::Claims;
use crate::errors::AuthError;

/// Validates an inbound bearer credential and produces the request's
/// `SecurityContext`.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate the raw bearer token and map its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] for any token that fails
    /// validation; the reason is logged, never surfaced to the caller.
    async fn validate_and_parse(&self, token: &str) -> Result<SecurityContext, AuthError>;
}

/// JWT validation settings, loaded from configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// Expected `iss` claim; unchecked when absent.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud` claim; unchecked when absent.
    #[serde(default)]
    pub audience: Option<String>,
    /// HS256 shared secret. Exactly one of this or
    /// `rsa_public_key_pem` must be set.
    #[serde(default)]
    pub hmac_secret: Option<SecretString>,
    /// RS256 public key in PEM form.
    #[serde(default)]
    pub rsa_public_key_pem: Option<String>,
}

/// The JWT validator could not be built from configuration.
#[derive(Error, Debug)]
pub enum ValidatorConfigError {
    #[error("jwt config needs exactly one of hmac_secret or rsa_public_key_pem")]
    AmbiguousKey,

    #[error("invalid RSA public key: {0}")]
    InvalidKey(String),
}

/// Signature/expiry validation via `jsonwebtoken`.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Build a validator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorConfigError`] when the key material is
    /// missing, ambiguous, or unparseable.
    pub fn from_config(config: &JwtConfig) -> Result<Self, ValidatorConfigError> {
        let (key, algorithm) = match (&config.hmac_secret, &config.rsa_public_key_pem) {
            (Some(secret), None) => (
                DecodingKey::from_secret(secret.expose_secret().as_bytes()),
                Algorithm::HS256,
            ),
            (None, Some(pem)) => (
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| ValidatorConfigError::InvalidKey(e.to_string()))?,
                Algorithm::RS256,
            ),
            _ => return Err(ValidatorConfigError::AmbiguousKey),
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &config.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        Ok(Self { key, validation })
    }
}

#[async_trait]
impl TokenValidator for JwtValidator {
    async fn validate_and_parse(&self, token: &str) -> Result<SecurityContext, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("bearer token rejected: {e}");
            AuthError::Unauthenticated
        })?;
        Ok(data.claims.into_security_context(token))
    }
}

/// A statically configured principal for the static validator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticPrincipal {
    pub token: SecretString,
    pub subject_id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Token validation against a fixed principal list.
///
/// Meant for single-node installs and tests where no identity provider
/// is reachable; the token values are opaque strings, not JWTs.
pub struct StaticTokenValidator {
    principals: Vec<StaticPrincipal>,
}

impl StaticTokenValidator {
    #[must_use]
    pub fn new(principals: Vec<StaticPrincipal>) -> Self {
        Self { principals }
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate_and_parse(&self, token: &str) -> Result<SecurityContext, AuthError> {
        let principal = self
            .principals
            .iter()
            .find(|p| p.token.expose_secret() == token)
            .ok_or(AuthError::Unauthenticated)?;

        Ok(SecurityContext::builder()
            .subject_id(principal.subject_id.clone())
            .tenant_id(principal.tenant_id.clone())
            .roles(principal.roles.clone())
            .bearer_token(token.to_owned())
            .build())
    }
}
