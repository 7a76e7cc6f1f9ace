//! On-behalf-of exchange against the identity provider.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use time::Duration;

/// The OAuth grant used for on-behalf-of exchanges.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REQUESTED_TOKEN_USE: &str = "on_behalf_of";

/// Exchanges an inbound credential for one scoped to a downstream
/// resource while preserving the original caller's identity.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Present `assertion` to the identity provider and request a token
    /// scoped to `resource`.
    ///
    /// # Errors
    ///
    /// [`ExchangeError::Transport`] when the provider is unreachable
    /// (retryable), [`ExchangeError::Rejected`] when it refuses the
    /// grant (not retryable).
    async fn exchange(
        &self,
        assertion: &SecretString,
        resource: &str,
    ) -> Result<ExchangedToken, ExchangeError>;
}

/// Result of a successful exchange.
#[derive(Debug)]
pub struct ExchangedToken {
    pub access_token: SecretString,
    pub expires_in: Duration,
}

/// One exchange attempt failed.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("exchange rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },
}

/// Identity-provider settings for the on-behalf-of flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OboConfig {
    /// Token endpoint URL of the identity provider.
    pub token_endpoint: String,
    /// This service's client id at the identity provider.
    pub client_id: String,
    /// This service's client secret.
    pub client_secret: SecretString,
}

/// The exchanger could not be constructed.
#[derive(Error, Debug)]
pub enum ExchangerSetupError {
    #[error("invalid token endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// HTTP implementation of [`TokenExchanger`].
pub struct OboExchanger {
    endpoint: Uri,
    client_id: String,
    client_secret: SecretString,
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl OboExchanger {
    /// Build the exchanger and its HTTPS client.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangerSetupError`] when the endpoint does not parse
    /// or the native TLS root store cannot be loaded.
    pub fn new(config: &OboConfig) -> Result<Self, ExchangerSetupError> {
        let endpoint: Uri =
            config
                .token_endpoint
                .parse()
                .map_err(|e: http::uri::InvalidUri| ExchangerSetupError::InvalidEndpoint {
                    endpoint: config.token_endpoint.clone(),
                    reason: e.to_string(),
                })?;

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| ExchangerSetupError::Tls(e.to_string()))?
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Self {
            endpoint,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            client: Client::builder(TokioExecutor::new()).build(https),
        })
    }
}

/// Successful token endpoint payload.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// OAuth error payload; fields are optional because providers differ.
#[derive(Default, Deserialize)]
struct OAuthErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[async_trait]
impl TokenExchanger for OboExchanger {
    #[tracing::instrument(skip_all, fields(resource))]
    async fn exchange(
        &self,
        assertion: &SecretString,
        resource: &str,
    ) -> Result<ExchangedToken, ExchangeError> {
        let form = serde_urlencoded::to_string([
            ("grant_type", JWT_BEARER_GRANT),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("assertion", assertion.expose_secret()),
            ("scope", resource),
            ("requested_token_use", REQUESTED_TOKEN_USE),
        ])
        .map_err(|e| ExchangeError::Transport(format!("form encoding failed: {e}")))?;

        let request = Request::post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::ACCEPT, "application/json")
            .body(Full::new(Bytes::from(form)))
            .map_err(|e| ExchangeError::Transport(format!("request build failed: {e}")))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?
            .to_bytes();

        if status.is_server_error() {
            return Err(ExchangeError::Transport(format!(
                "token endpoint returned {status}"
            )));
        }

        if !status.is_success() {
            let parsed: OAuthErrorResponse = serde_json::from_slice(&body).unwrap_or_default();
            let reason = if parsed.error.is_empty() {
                format!("unexpected response body ({} bytes)", body.len())
            } else if parsed.error_description.is_empty() {
                parsed.error
            } else {
                format!("{}: {}", parsed.error, parsed.error_description)
            };
            return Err(ExchangeError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        let token: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            ExchangeError::Rejected {
                status: status.as_u16(),
                reason: format!("malformed token response: {e}"),
            }
        })?;

        Ok(ExchangedToken {
            access_token: token.access_token.into(),
            expires_in: Duration::seconds(token.expires_in.max(0)),
        })
    }
}
