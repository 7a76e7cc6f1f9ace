//! Invoice retrieval contract.

use async_trait::async_trait;
use bytes::Bytes;
use secrecy::SecretString;
use uuid::Uuid;

use super::error::DomainError;

/// An invoice document as served by the downstream invoicing service.
///
/// The body is passed through to the caller unmodified; this module
/// never parses or re-renders invoices.
#[derive(Debug, Clone)]
pub struct Invoice {
    pub content_type: String,
    pub body: Bytes,
}

/// Gateway to the downstream invoicing service.
#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    /// Fetch the invoice for `order_id`, authenticating with the
    /// delegated bearer `token`.
    ///
    /// # Errors
    ///
    /// [`DomainError::Downstream`] for non-success downstream statuses,
    /// [`DomainError::DownstreamUnavailable`] when the service cannot
    /// be reached.
    async fn fetch_invoice(
        &self,
        order_id: Uuid,
        token: &SecretString,
    ) -> Result<Invoice, DomainError>;
}
