//! Health and Prometheus metrics endpoints.

pub mod health;
pub mod metrics;
