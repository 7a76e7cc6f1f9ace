use axum::response::{IntoResponse, Response};
use http::StatusCode;
use orderhub_http::Problem;
use thiserror::Error;

/// Failures produced by the authentication/authorization pipeline.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// No credential, or a credential that failed validation.
    #[error("missing or invalid credentials")]
    Unauthenticated,

    /// Valid credential, insufficient roles for the route's tier.
    #[error("insufficient permissions")]
    Forbidden,

    /// Pipeline wiring problem (e.g. middleware not installed).
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let problem = match &self {
            Self::Unauthenticated => Problem::new(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Missing or invalid Authorization header",
            ),
            // The detail deliberately does not say which role set the
            // route required.
            Self::Forbidden => Problem::new(
                StatusCode::FORBIDDEN,
                "Forbidden",
                "Insufficient permissions",
            ),
            Self::Internal(_) => Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Internal authentication error",
            ),
        };
        problem.into_response()
    }
}
