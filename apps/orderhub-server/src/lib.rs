//! Library surface of the Orderhub server, split out so integration
//! tests can assemble the router exactly as the binary does.

pub mod bootstrap;
pub mod config;
