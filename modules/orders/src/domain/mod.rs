pub mod error;
pub mod invoice;
pub mod model;
pub mod repo;
pub mod service;
