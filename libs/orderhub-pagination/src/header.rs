//! Out-of-band pagination metadata header.
//!
//! The metadata travels in a response header so clients can page through
//! results without parsing the body. The header name must also appear in
//! the CORS `expose-headers` allow-list or browsers will hide it.

use http::HeaderValue;

use crate::page::PageMeta;

/// Response header carrying the JSON-encoded [`PageMeta`].
pub const PAGINATION_HEADER: &str = "x-pagination";

impl PageMeta {
    /// Encode this metadata as the `x-pagination` header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be encoded, which would
    /// indicate a serialization bug rather than bad input.
    pub fn to_header_value(&self) -> Result<HeaderValue, MetaEncodingError> {
        let json = serde_json::to_string(self).map_err(|e| MetaEncodingError(e.to_string()))?;
        HeaderValue::from_str(&json).map_err(|e| MetaEncodingError(e.to_string()))
    }
}

/// Pagination metadata could not be rendered as a header value.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode pagination metadata: {0}")]
pub struct MetaEncodingError(String);
