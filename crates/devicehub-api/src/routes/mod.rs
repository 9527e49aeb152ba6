//! # API Routes
//!
//! HTTP route handlers, grouped by resource.

pub mod devices;
