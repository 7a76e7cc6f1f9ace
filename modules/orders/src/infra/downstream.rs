//! HTTP client for the downstream invoicing service.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderName, Request, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

use crate::config::DownstreamConfig;
use crate::domain::error::DomainError;
use crate::domain::invoice::{Invoice, InvoiceGateway};

/// The invoice client could not be constructed from its configuration.
#[derive(Error, Debug)]
pub enum InvoiceClientError {
    #[error("invalid downstream base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid subscription key header '{name}'")]
    InvalidHeaderName { name: String },

    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// [`InvoiceGateway`] implementation over HTTP.
///
/// Sends `GET {base_url}/invoices/{order_id}` with the delegated bearer
/// token and the configured subscription-key header, and passes the
/// response body through untouched.
pub struct HttpInvoiceClient {
    base_url: String,
    subscription_key_header: HeaderName,
    subscription_key: SecretString,
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl HttpInvoiceClient {
    /// Build the client and its HTTPS connector.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceClientError`] when the base URL or header name
    /// is malformed, or the native TLS root store cannot be loaded.
    pub fn new(config: &DownstreamConfig) -> Result<Self, InvoiceClientError> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        base_url
            .parse::<Uri>()
            .map_err(|e| InvoiceClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        let subscription_key_header = config
            .subscription_key_header
            .parse::<HeaderName>()
            .map_err(|_| InvoiceClientError::InvalidHeaderName {
                name: config.subscription_key_header.clone(),
            })?;

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| InvoiceClientError::Tls(e.to_string()))?
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Self {
            base_url,
            subscription_key_header,
            subscription_key: config.subscription_key.clone(),
            client: Client::builder(TokioExecutor::new()).build(https),
        })
    }
}

#[async_trait]
impl InvoiceGateway for HttpInvoiceClient {
    #[tracing::instrument(skip_all, fields(%order_id))]
    async fn fetch_invoice(
        &self,
        order_id: Uuid,
        token: &SecretString,
    ) -> Result<Invoice, DomainError> {
        let uri: Uri = format!("{}/invoices/{order_id}", self.base_url)
            .parse()
            .map_err(|e: http::uri::InvalidUri| DomainError::downstream_unavailable(e.to_string()))?;

        let request = Request::get(uri)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            )
            .header(
                self.subscription_key_header.clone(),
                self.subscription_key.expose_secret(),
            )
            .body(Full::new(Bytes::new()))
            .map_err(|e| DomainError::downstream_unavailable(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| DomainError::downstream_unavailable(e.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| DomainError::downstream_unavailable(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            let detail = String::from_utf8_lossy(&body).into_owned();
            tracing::warn!(status = status.as_u16(), "invoice fetch failed downstream");
            return Err(DomainError::downstream(status.as_u16(), detail));
        }

        Ok(Invoice {
            content_type,
            body,
        })
    }
}
