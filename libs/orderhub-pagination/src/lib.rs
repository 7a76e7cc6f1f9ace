//! Windowed pagination for Orderhub.
//!
//! A [`WindowedSource`] exposes a countable, ordered data set; [`paginate`]
//! turns it plus a validated [`PageRequest`] into an immutable [`Page`]
//! carrying the window and derived [`PageMeta`]. The metadata is meant to
//! travel out-of-band in the [`PAGINATION_HEADER`] response header rather
//! than inline in the body.

pub mod header;
pub mod page;
pub mod source;

pub use header::{MetaEncodingError, PAGINATION_HEADER};
pub use page::{Page, PageMeta, PageRequest, PaginationError};
pub use source::{PaginateError, WindowedSource, paginate};
