//! Telemetry setup shared by lakestar binaries and tests.
//!
//! Provides tracing subscriber initialization and the Prometheus metrics recorder.

pub mod metrics;
pub mod tracing;
