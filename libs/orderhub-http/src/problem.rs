//! RFC-9457 Problem Details responses.
//!
//! Every error that crosses the HTTP boundary is rendered as a
//! `application/problem+json` body so clients get a uniform shape
//! regardless of which layer produced the failure.

use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;

/// Media type for problem responses.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// An RFC-9457 Problem Details payload.
///
/// The `type` member is left at `about:blank`; the status/title/detail
/// triple is what callers key off.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    problem_type: String,
    title: String,
    status: u16,
    detail: String,
}

impl Problem {
    /// Build a problem from a status, short title, and human-readable detail.
    #[must_use]
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            problem_type: "about:blank".to_owned(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// The HTTP status carried by this problem.
    ///
    /// Falls back to 500 if the stored code is somehow out of range.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::to_vec(&self).unwrap_or_else(|_| b"{}".to_vec());
        let mut response = (status, body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
        );
        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn problem_renders_as_problem_json() {
        let problem = Problem::new(StatusCode::FORBIDDEN, "Forbidden", "Insufficient permissions");
        let response = problem.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_CONTENT_TYPE
        );

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "about:blank");
        assert_eq!(value["title"], "Forbidden");
        assert_eq!(value["status"], 403);
        assert_eq!(value["detail"], "Insufficient permissions");
    }

    #[test]
    fn status_round_trips() {
        let problem = Problem::new(StatusCode::BAD_GATEWAY, "Bad Gateway", "upstream failed");
        assert_eq!(problem.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(problem.title(), "Bad Gateway");
    }
}
