//! Axum middleware and extractor for the authorization pipeline.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, Method, request::Parts},
    response::{IntoResponse, Response},
};
use axum::extract::FromRequestParts;
use orderhub_security::{AuthorizationDecision, RolePolicy, SecurityContext};
use tower::{Layer, Service};

use crate::errors::AuthError;
use crate::route_policy::RouteTierPolicy;
use crate::validator::TokenValidator;

/// Extractor for the request's `SecurityContext`.
///
/// Fails with a 500 problem when the auth middleware did not run, which
/// indicates a wiring bug rather than a caller error.
#[derive(Debug, Clone)]
pub struct Authz(pub SecurityContext);

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .map(Authz)
            .ok_or(AuthError::Internal(
                "SecurityContext not found - auth middleware not configured".to_owned(),
            ))
    }
}

/// Shared state for the authorization middleware.
struct AuthState {
    validator: Arc<dyn TokenValidator>,
    roles: Arc<RolePolicy>,
    routes: Arc<RouteTierPolicy>,
}

/// Layer that authenticates requests and enforces per-route policy tiers.
#[derive(Clone)]
pub struct AuthLayer {
    state: Arc<AuthState>,
}

impl AuthLayer {
    #[must_use]
    pub fn new(
        validator: Arc<dyn TokenValidator>,
        roles: Arc<RolePolicy>,
        routes: Arc<RouteTierPolicy>,
    ) -> Self {
        Self {
            state: Arc::new(AuthState {
                validator,
                roles,
                routes,
            }),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            state: self.state.clone(),
        }
    }
}

/// Service produced by [`AuthLayer`].
///
/// For each request:
/// 1. Skips CORS preflight requests
/// 2. Resolves the route's policy tier via [`RouteTierPolicy`]
/// 3. For public routes: inserts an anonymous `SecurityContext`
/// 4. Otherwise: validates the bearer token, evaluates the role policy
///    for the tier, and inserts the authenticated `SecurityContext`
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    state: Arc<AuthState>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let not_ready_inner = self.inner.clone();
        let mut ready_inner = std::mem::replace(&mut self.inner, not_ready_inner);

        Box::pin(async move {
            if is_preflight_request(request.method(), request.headers()) {
                return ready_inner.call(request).await;
            }

            let Some(tier) = state.routes.resolve(request.method(), request.uri().path()) else {
                request.extensions_mut().insert(SecurityContext::anonymous());
                return ready_inner.call(request).await;
            };

            let Some(token) = extract_bearer_token(request.headers()) else {
                return Ok(AuthError::Unauthenticated.into_response());
            };

            let ctx = match state.validator.validate_and_parse(token).await {
                Ok(ctx) => ctx,
                Err(err) => return Ok(err.into_response()),
            };

            match state.roles.evaluate(&ctx, tier) {
                AuthorizationDecision::Granted => {
                    request.extensions_mut().insert(ctx);
                    ready_inner.call(request).await
                }
                AuthorizationDecision::Denied => Ok(AuthError::Forbidden.into_response()),
            }
        })
    }
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
}

/// Check if this is a CORS preflight request
///
/// Preflight requests are OPTIONS requests with:
/// - Origin header present
/// - Access-Control-Request-Method header present
fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn bearer_extraction_strips_scheme_and_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer  abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn non_bearer_scheme_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn preflight_detection_requires_all_three_markers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, "https://app.example".parse().unwrap());
        assert!(!is_preflight_request(&Method::OPTIONS, &headers));

        headers.insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            "GET".parse().unwrap(),
        );
        assert!(is_preflight_request(&Method::OPTIONS, &headers));
        assert!(!is_preflight_request(&Method::GET, &headers));
    }
}

// End-to-end middleware behavior (401/403/200 and anonymous public
// routes) is covered in tests/auth_middleware.rs against a real router.
