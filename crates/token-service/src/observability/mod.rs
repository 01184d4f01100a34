//! Observability for the token service: Prometheus metrics.

pub mod metrics;
