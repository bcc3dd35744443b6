//! tapflow daemon library.
//!
//! Exposes the daemon's building blocks for integration testing.
//! In production `tapflow-daemon` runs as a binary (main.rs).

pub mod cli;
pub mod ingest;
pub mod logging;
pub mod metrics_server;
pub mod orchestrator;
pub mod sink;
