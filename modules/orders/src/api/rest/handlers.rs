//! Axum handlers for the orders surface.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use orderhub_auth::Authz;
use orderhub_http::Problem;
use orderhub_pagination::{PAGINATION_HEADER, PageRequest};
use uuid::Uuid;

use super::dto::{ListOrdersQuery, OrderDto};
use crate::domain::service::OrdersService;

/// `GET /orders/v1/orders`
///
/// The body is the bare items array; pagination metadata travels in the
/// `x-pagination` response header.
pub async fn list_orders(
    State(service): State<Arc<OrdersService>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Response, Problem> {
    let request = PageRequest::new(
        query.page_number.unwrap_or(ListOrdersQuery::DEFAULT_PAGE_NUMBER),
        query.page_size.unwrap_or(ListOrdersQuery::DEFAULT_PAGE_SIZE),
    )
    .map_err(|e| Problem::new(StatusCode::BAD_REQUEST, "Invalid Pagination", e.to_string()))?;

    let page = service.list_orders(&request).await?;
    let (items, meta) = page.into_parts();

    let header_value = meta.to_header_value().map_err(|e| {
        Problem::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Metadata Encoding Error",
            e.to_string(),
        )
    })?;

    let dtos: Vec<OrderDto> = items.into_iter().map(OrderDto::from).collect();
    let mut response = Json(dtos).into_response();
    response.headers_mut().insert(PAGINATION_HEADER, header_value);
    Ok(response)
}

/// `GET /orders/v1/orders/{id}`
pub async fn get_order(
    State(service): State<Arc<OrdersService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDto>, Problem> {
    let order = service.get_order(id).await?;
    Ok(Json(OrderDto::from(order)))
}

/// `GET /orders/v1/orders/{id}/invoice`
///
/// Streams the downstream invoice body through unchanged, re-using its
/// content type.
pub async fn get_invoice(
    State(service): State<Arc<OrdersService>>,
    Authz(ctx): Authz,
    Path(id): Path<Uuid>,
) -> Result<Response, Problem> {
    let invoice = service.fetch_invoice(&ctx, id).await?;

    let content_type = HeaderValue::from_str(&invoice.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = invoice.body.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}
