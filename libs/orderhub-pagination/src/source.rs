//! The windowed data-source contract and the page builder itself.

use async_trait::async_trait;
use thiserror::Error;

use crate::page::{Page, PageMeta, PageRequest};

/// A countable data set that can serve contiguous windows in a total order.
///
/// Implementations must apply a stable total order before slicing the
/// window; paginating an unordered source is undefined. The two reads
/// ([`count`](Self::count) then [`fetch_window`](Self::fetch_window)) are
/// *not* a single snapshot: under concurrent writes the count and the
/// window may observe different store states, so `totalCount` can be off
/// relative to the returned rows. That weaker guarantee is deliberate.
#[async_trait]
pub trait WindowedSource<T>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Count of all matching rows, ignoring the window.
    async fn count(&self) -> Result<u64, Self::Error>;

    /// Rows in the half-open window `[offset, offset + limit)` of the
    /// totally ordered result set. A window past the end yields an empty
    /// vector, not an error.
    async fn fetch_window(&self, offset: u64, limit: u64) -> Result<Vec<T>, Self::Error>;
}

/// Failure while building a page.
#[derive(Error, Debug)]
pub enum PaginateError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// The underlying data source failed one of its two reads.
    #[error("data source error: {0}")]
    Source(#[source] E),

    /// The source returned more rows than the requested window allows,
    /// which would break the `items.len() <= page_size` invariant.
    #[error("source returned {returned} rows for a window of {limit}")]
    OversizedWindow { returned: usize, limit: u64 },
}

/// Build a [`Page`] from a windowed source.
///
/// Performs exactly two reads, strictly sequenced: the count first, then
/// the window fetch (the window depends on nothing but the request, but
/// the metadata must reflect the count observed before the fetch).
///
/// # Errors
///
/// Returns [`PaginateError::Source`] when either read fails, and
/// [`PaginateError::OversizedWindow`] if the source violates the window
/// contract.
pub async fn paginate<T, S>(
    source: &S,
    request: &PageRequest,
) -> Result<Page<T>, PaginateError<S::Error>>
where
    S: WindowedSource<T> + ?Sized,
{
    let total_count = source.count().await.map_err(PaginateError::Source)?;

    let items = source
        .fetch_window(request.offset(), request.page_size())
        .await
        .map_err(PaginateError::Source)?;

    if items.len() as u64 > request.page_size() {
        return Err(PaginateError::OversizedWindow {
            returned: items.len(),
            limit: request.page_size(),
        });
    }

    Ok(Page::new(items, PageMeta::derive(request, total_count)))
}
