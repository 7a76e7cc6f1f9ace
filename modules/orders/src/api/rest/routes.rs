//! Route table and policy tiers for the orders surface.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use http::Method;
use orderhub_auth::RouteTierPolicy;
use orderhub_auth::route_policy::RoutePolicyError;
use orderhub_security::PolicyTier;

use super::handlers;
use crate::domain::service::OrdersService;

/// Build the orders router. The auth middleware is layered by the host
/// application so that one policy covers all mounted modules.
pub fn router(service: Arc<OrdersService>) -> Router {
    Router::new()
        .route("/orders/v1/orders", get(handlers::list_orders))
        .route("/orders/v1/orders/{id}", get(handlers::get_order))
        .route("/orders/v1/orders/{id}/invoice", get(handlers::get_invoice))
        .with_state(service)
}

/// Register this module's policy tiers: listing and lookup are standard,
/// invoice retrieval is elevated.
///
/// # Errors
///
/// Returns [`RoutePolicyError`] when a pattern conflicts with one
/// already registered on `policy`.
pub fn route_tiers(policy: RouteTierPolicy) -> Result<RouteTierPolicy, RoutePolicyError> {
    policy
        .require(Method::GET, "/orders/v1/orders", PolicyTier::Standard)?
        .require(Method::GET, "/orders/v1/orders/{id}", PolicyTier::Standard)?
        .require(
            Method::GET,
            "/orders/v1/orders/{id}/invoice",
            PolicyTier::Elevated,
        )
}
