//! Orders module.
//!
//! Exposes the orders REST surface (paginated listing, single-order
//! lookup, and invoice retrieval through the delegated token broker)
//! over a repository abstraction. The module owns its domain model,
//! its storage adapters, and its HTTP mapping; the host application
//! wires the router, the auth middleware, and the broker together.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;

pub use config::DownstreamConfig;
pub use domain::service::OrdersService;
