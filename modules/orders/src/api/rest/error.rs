//! Map domain errors onto HTTP Problem responses.

use http::StatusCode;
use orderhub_auth::BrokerError;
use orderhub_http::Problem;

use crate::domain::error::DomainError;

/// Convert domain errors to HTTP Problem responses.
pub fn domain_error_to_problem(err: DomainError) -> Problem {
    match err {
        DomainError::NotFound { id } => Problem::new(
            StatusCode::NOT_FOUND,
            "Order Not Found",
            format!("No order with id {id}"),
        ),

        DomainError::Pagination(e) => {
            Problem::new(StatusCode::BAD_REQUEST, "Invalid Pagination", e.to_string())
        }

        DomainError::Repository { message } => {
            Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage Error", message)
        }

        DomainError::TokenAcquisition(broker) => broker_error_to_problem(&broker),

        // Downstream statuses pass through when they are valid HTTP
        // error codes; anything else degrades to a 502.
        DomainError::Downstream { status, detail } => {
            let status = StatusCode::from_u16(status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            Problem::new(status, "Downstream Service Error", detail)
        }

        DomainError::DownstreamUnavailable { reason } => Problem::new(
            StatusCode::BAD_GATEWAY,
            "Downstream Service Unavailable",
            reason,
        ),
    }
}

fn broker_error_to_problem(err: &BrokerError) -> Problem {
    match err {
        // The identity provider refused the grant; surfacing the exact
        // provider response would leak exchange internals.
        BrokerError::ExchangeRejected { status, .. } => Problem::new(
            StatusCode::BAD_GATEWAY,
            "Token Exchange Rejected",
            format!("The identity provider rejected the exchange (status {status})"),
        ),

        BrokerError::Transport { .. } | BrokerError::TaskFailed => Problem::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Token Exchange Unavailable",
            "The identity provider could not be reached",
        ),

        // A protected route without a bearer token means the auth
        // middleware is miswired, not a caller mistake.
        BrokerError::MissingAssertion => Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing Credential",
            "No inbound credential was available for delegation",
        ),
    }
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(e)
    }
}
