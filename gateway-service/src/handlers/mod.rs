//! HTTP handlers for the gateway.

pub mod auth;
pub mod facilities;
pub mod metrics;
pub mod pages;
pub mod users;
