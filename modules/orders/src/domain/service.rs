//! Order domain operations.

use std::sync::Arc;

use async_trait::async_trait;
use orderhub_auth::TokenBroker;
use orderhub_pagination::{Page, PageRequest, WindowedSource, paginate};
use orderhub_security::SecurityContext;
use uuid::Uuid;

use super::error::DomainError;
use super::invoice::{Invoice, InvoiceGateway};
use super::model::Order;
use super::repo::OrderRepository;

/// Application service for the orders module.
///
/// Listing goes through the page builder over the repository; invoice
/// retrieval trades the caller's credential for a delegated one via the
/// broker before calling the downstream gateway.
pub struct OrdersService {
    repo: Arc<dyn OrderRepository>,
    broker: Arc<TokenBroker>,
    invoices: Arc<dyn InvoiceGateway>,
    downstream_resource: String,
}

/// Adapter exposing the repository as a windowed source.
struct RepoWindow<'a>(&'a dyn OrderRepository);

#[async_trait]
impl WindowedSource<Order> for RepoWindow<'_> {
    type Error = DomainError;

    async fn count(&self) -> Result<u64, DomainError> {
        self.0.count().await
    }

    async fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<Order>, DomainError> {
        self.0.fetch_window(offset, limit).await
    }
}

impl OrdersService {
    #[must_use]
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        broker: Arc<TokenBroker>,
        invoices: Arc<dyn InvoiceGateway>,
        downstream_resource: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            broker,
            invoices,
            downstream_resource: downstream_resource.into(),
        }
    }

    /// List one page of orders.
    ///
    /// # Errors
    ///
    /// Propagates repository failures as [`DomainError::Repository`].
    pub async fn list_orders(&self, request: &PageRequest) -> Result<Page<Order>, DomainError> {
        let page = paginate(&RepoWindow(self.repo.as_ref()), request).await?;
        tracing::debug!(
            page = page.meta().current_page,
            total = page.meta().total_count,
            "listed orders"
        );
        Ok(page)
    }

    /// Look up a single order.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`] when no order has the given id.
    pub async fn get_order(&self, id: Uuid) -> Result<Order, DomainError> {
        self.repo
            .find(id)
            .await?
            .ok_or(DomainError::NotFound { id })
    }

    /// Fetch the invoice for an order from the downstream service,
    /// acting on behalf of the caller.
    ///
    /// # Errors
    ///
    /// [`DomainError::NotFound`] for unknown orders,
    /// [`DomainError::TokenAcquisition`] when the broker cannot produce
    /// a delegated credential, and the gateway's downstream errors
    /// otherwise.
    pub async fn fetch_invoice(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Invoice, DomainError> {
        let order = self.get_order(id).await?;
        let delegated = self
            .broker
            .acquire(ctx, &self.downstream_resource)
            .await?;
        self.invoices.fetch_invoice(order.id, delegated.bearer()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use bytes::Bytes;
    use orderhub_auth::BrokerSettings;
    use orderhub_auth::broker::{ExchangeError, ExchangedToken, TokenExchanger};
    use secrecy::SecretString;
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::domain::model::OrderStatus;

    struct FixtureRepo {
        orders: Vec<Order>,
    }

    fn order(n: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer: format!("customer-{n}"),
            status: OrderStatus::Paid,
            total_cents: n * 100,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::days(n),
        }
    }

    #[async_trait]
    impl OrderRepository for FixtureRepo {
        async fn count(&self) -> Result<u64, DomainError> {
            Ok(self.orders.len() as u64)
        }

        async fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<Order>, DomainError> {
            let start = usize::try_from(offset).unwrap();
            let take = usize::try_from(limit).unwrap();
            Ok(self.orders.iter().skip(start).take(take).cloned().collect())
        }

        async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
            Ok(self.orders.iter().find(|o| o.id == id).cloned())
        }
    }

    struct CountingExchanger {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TokenExchanger for CountingExchanger {
        async fn exchange(
            &self,
            _assertion: &SecretString,
            _resource: &str,
        ) -> Result<ExchangedToken, ExchangeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExchangedToken {
                access_token: SecretString::from("delegated".to_owned()),
                expires_in: Duration::minutes(30),
            })
        }
    }

    struct RecordingGateway {
        calls: AtomicU32,
    }

    #[async_trait]
    impl InvoiceGateway for RecordingGateway {
        async fn fetch_invoice(
            &self,
            _order_id: Uuid,
            _token: &SecretString,
        ) -> Result<Invoice, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Invoice {
                content_type: "application/pdf".to_owned(),
                body: Bytes::from_static(b"%PDF-stub"),
            })
        }
    }

    fn service_over(orders: Vec<Order>) -> (OrdersService, Arc<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway {
            calls: AtomicU32::new(0),
        });
        let broker = Arc::new(TokenBroker::new(
            Arc::new(CountingExchanger {
                calls: AtomicU32::new(0),
            }),
            BrokerSettings::default(),
        ));
        let service = OrdersService::new(
            Arc::new(FixtureRepo { orders }),
            broker,
            gateway.clone(),
            "https://invoices.example/.default",
        );
        (service, gateway)
    }

    fn caller() -> SecurityContext {
        SecurityContext::builder()
            .subject_id("user-1")
            .tenant_id("tenant-a")
            .bearer_token("inbound".to_owned())
            .build()
    }

    #[tokio::test]
    async fn lists_a_page_with_derived_metadata() {
        let (service, _) = service_over((1..=25).map(order).collect());
        let request = PageRequest::new(3, 10).unwrap();

        let page = service.list_orders(&request).await.unwrap();

        assert_eq!(page.items().len(), 5);
        assert_eq!(page.meta().total_count, 25);
        assert_eq!(page.meta().total_pages, 3);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let (service, _) = service_over(vec![order(1)]);

        let err = service.get_order(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn invoice_flows_through_broker_and_gateway() {
        let rows = vec![order(1)];
        let id = rows[0].id;
        let (service, gateway) = service_over(rows);

        let invoice = service.fetch_invoice(&caller(), id).await.unwrap();

        assert_eq!(invoice.content_type, "application/pdf");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invoice_for_unknown_order_skips_the_exchange() {
        let (service, gateway) = service_over(vec![order(1)]);

        let err = service
            .fetch_invoice(&caller(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_acquire_a_credential() {
        let rows = vec![order(1)];
        let id = rows[0].id;
        let (service, _) = service_over(rows);

        let err = service
            .fetch_invoice(&SecurityContext::anonymous(), id)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::TokenAcquisition(_)));
    }
}
