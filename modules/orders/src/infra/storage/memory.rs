//! In-memory order store.

use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::model::Order;
use crate::domain::repo::OrderRepository;

/// Order store backed by a sorted in-process vector.
///
/// Rows are kept ordered by `created_at`, then `id`, so windows are
/// stable across reads. Suited to demos and tests; a database-backed
/// repository replaces it in real deployments.
pub struct InMemoryOrderStore {
    rows: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    #[must_use]
    pub fn new(mut orders: Vec<Order>) -> Self {
        orders.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self {
            rows: RwLock::new(orders),
        }
    }

    /// Insert an order, keeping the total order intact.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Repository`] if the store lock is poisoned.
    pub fn insert(&self, order: Order) -> Result<(), DomainError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| DomainError::repository("order store lock poisoned"))?;
        let position = rows
            .binary_search_by(|row| {
                row.created_at
                    .cmp(&order.created_at)
                    .then_with(|| row.id.cmp(&order.id))
            })
            .unwrap_or_else(|insert_at| insert_at);
        rows.insert(position, order);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn count(&self) -> Result<u64, DomainError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| DomainError::repository("order store lock poisoned"))?;
        Ok(rows.len() as u64)
    }

    async fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<Order>, DomainError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| DomainError::repository("order store lock poisoned"))?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(rows.iter().skip(start).take(take).cloned().collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| DomainError::repository("order store lock poisoned"))?;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::domain::model::OrderStatus;

    fn order_at(days: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            customer: "acme".to_owned(),
            status: OrderStatus::Pending,
            total_cents: 1000,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::days(days),
        }
    }

    #[tokio::test]
    async fn windows_follow_creation_order() {
        let store = InMemoryOrderStore::new(vec![order_at(3), order_at(1), order_at(2)]);

        let window = store.fetch_window(0, 10).await.unwrap();

        let days: Vec<i64> = window
            .iter()
            .map(|o| (o.created_at - OffsetDateTime::UNIX_EPOCH).whole_days())
            .collect();
        assert_eq!(days, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn insert_keeps_the_order_stable() {
        let store = InMemoryOrderStore::new(vec![order_at(1), order_at(3)]);
        store.insert(order_at(2)).unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        let window = store.fetch_window(1, 1).await.unwrap();
        assert_eq!(
            (window[0].created_at - OffsetDateTime::UNIX_EPOCH).whole_days(),
            2
        );
    }

    #[tokio::test]
    async fn window_past_the_end_is_empty() {
        let store = InMemoryOrderStore::new(vec![order_at(1)]);

        let window = store.fetch_window(10, 5).await.unwrap();

        assert!(window.is_empty());
    }
}
