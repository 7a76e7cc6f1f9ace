//! Shared HTTP types for Orderhub services.

pub mod problem;

pub use problem::Problem;
