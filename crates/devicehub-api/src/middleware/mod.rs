//! # HTTP Middleware
//!
//! Cross-cutting request handling layered over the routers.

pub mod metrics;
