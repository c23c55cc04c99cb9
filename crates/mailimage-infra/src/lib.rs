//! Mailimage Infrastructure Library
//!
//! Shared infrastructure used by the binary: telemetry initialisation for the server
//! and the one-shot insert command.

pub mod telemetry;

pub use telemetry::{init_telemetry, TelemetryConfig};
