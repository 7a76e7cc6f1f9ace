//! Wires configuration into the running router: validator, role policy,
//! token broker, orders module, CORS, and the auth middleware.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use http::{HeaderName, HeaderValue, Method};
use orderhub_auth::broker::{OboConfig, OboExchanger};
use orderhub_auth::validator::TokenValidator;
use orderhub_auth::{
    AuthLayer, BrokerSettings, JwtValidator, RouteTierPolicy, StaticTokenValidator, TokenBroker,
};
use orderhub_security::RolePolicy;
use orders::OrdersService;
use orders::domain::model::{Order, OrderStatus};
use orders::infra::downstream::HttpInvoiceClient;
use orders::infra::storage::InMemoryOrderStore;
use time::{Duration, OffsetDateTime};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{AppConfig, AuthMode, CorsConfig};

/// Build the full application router from validated configuration.
///
/// # Errors
///
/// Returns an error when a component cannot be constructed from its
/// configuration (bad key material, malformed URLs or header names).
pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let validator: Arc<dyn TokenValidator> = match config.auth.mode {
        AuthMode::Jwt => {
            let jwt = config
                .auth
                .jwt
                .as_ref()
                .context("auth.jwt section is required when auth.mode = jwt")?;
            Arc::new(JwtValidator::from_config(jwt)?)
        }
        AuthMode::Static => Arc::new(StaticTokenValidator::new(config.auth.principals.clone())),
    };

    let roles = Arc::new(RolePolicy::new(config.auth.roles.clone()));
    let tiers = Arc::new(orders::api::rest::routes::route_tiers(
        RouteTierPolicy::new(),
    )?);

    let exchanger = OboExchanger::new(&OboConfig {
        token_endpoint: config.obo.token_endpoint.clone(),
        client_id: config.obo.client_id.clone(),
        client_secret: config.obo.client_secret.clone(),
    })?;
    let broker = Arc::new(TokenBroker::new(
        Arc::new(exchanger),
        BrokerSettings {
            safety_margin: Duration::seconds(i64::from(config.obo.safety_margin_secs)),
            max_attempts: config.obo.max_attempts,
        },
    ));

    let invoices = Arc::new(HttpInvoiceClient::new(&config.downstream)?);
    let store = Arc::new(InMemoryOrderStore::new(demo_orders(
        config.demo.seed_orders,
    )));
    let service = Arc::new(OrdersService::new(
        store,
        broker,
        invoices,
        config.downstream.resource.clone(),
    ));

    // CORS sits outside auth so preflights never hit the validator.
    Ok(orders::api::rest::routes::router(service)
        .route("/healthz", get(healthz))
        .layer(AuthLayer::new(validator, roles, tiers))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors)?))
}

async fn healthz() -> &'static str {
    "ok"
}

fn cors_layer(config: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let mut layer = CorsLayer::new().max_age(std::time::Duration::from_secs(
        config.max_age_seconds,
    ));

    layer = if config.allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins = config
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("bad CORS origin '{o}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        layer.allow_origin(origins)
    };

    let methods = config
        .allowed_methods
        .iter()
        .map(|m| {
            m.parse::<Method>()
                .with_context(|| format!("bad CORS method '{m}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    layer = layer.allow_methods(methods);

    layer = if config.allowed_headers.iter().any(|h| h == "*") {
        layer.allow_headers(Any)
    } else {
        layer.allow_headers(parse_header_names(&config.allowed_headers)?)
    };

    Ok(layer.expose_headers(parse_header_names(&config.exposed_headers)?))
}

fn parse_header_names(names: &[String]) -> anyhow::Result<Vec<HeaderName>> {
    names
        .iter()
        .map(|n| {
            n.parse::<HeaderName>()
                .with_context(|| format!("bad header name '{n}'"))
        })
        .collect()
}

/// Synthetic data set for demo installs; deterministic ids so listings
/// are stable across restarts.
fn demo_orders(count: u32) -> Vec<Order> {
    const STATUSES: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Cancelled,
    ];

    (1..=count)
        .zip(STATUSES.into_iter().cycle())
        .map(|(n, status)| Order {
            id: Uuid::from_u128(u128::from(n)),
            customer: format!("demo-customer-{n}"),
            status,
            total_cents: i64::from(n) * 250,
            created_at: OffsetDateTime::UNIX_EPOCH + Duration::days(i64::from(n)),
        })
        .collect()
}
