//! Repository contract for orders.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::DomainError;
use super::model::Order;

/// Read access to the order store.
///
/// `count` and `fetch_window` form the windowed source behind the page
/// builder; implementations must order rows by `created_at`, then `id`,
/// before slicing. The two calls are not a snapshot: concurrent writes
/// between them may make the count and the window disagree.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Total number of orders in the store.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Repository`] when the store fails.
    async fn count(&self) -> Result<u64, DomainError>;

    /// Orders in `[offset, offset + limit)` of the ordered result set.
    /// A window past the end yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Repository`] when the store fails.
    async fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<Order>, DomainError>;

    /// Look up a single order by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Repository`] when the store fails.
    async fn find(&self, id: Uuid) -> Result<Option<Order>, DomainError>;
}
