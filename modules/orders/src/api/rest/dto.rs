//! REST DTOs for the orders surface.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::model::{Order, OrderStatus};

/// REST representation of an order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDto {
    pub id: Uuid,
    pub customer: String,
    pub status: OrderStatusDto,
    pub total_cents: i64,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusDto {
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl From<OrderStatus> for OrderStatusDto {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => Self::Pending,
            OrderStatus::Paid => Self::Paid,
            OrderStatus::Shipped => Self::Shipped,
            OrderStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer: order.customer,
            status: order.status.into(),
            total_cents: order.total_cents,
            created_at: order.created_at,
        }
    }
}

/// Query parameters for the order listing endpoint.
///
/// Raw and unvalidated; the handler runs them through the page-request
/// validation and rejects out-of-range values with a 400 rather than
/// clamping them.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListOrdersQuery {
    pub const DEFAULT_PAGE_NUMBER: i64 = 1;
    pub const DEFAULT_PAGE_SIZE: i64 = 10;
}
