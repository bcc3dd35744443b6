//! CLI argument definitions for tapflow-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// tapflow stream processing daemon.
///
/// Reads `{"topic": ..., "record": ...}` envelopes as JSON lines,
/// routes each record to the processor subscribed to its topic and
/// writes derived events, log lines and inventory updates as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "tapflow-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to tapflow.toml configuration file.
    #[arg(short, long, default_value = "/etc/tapflow/tapflow.toml")]
    pub config: PathBuf,

    /// Read envelopes from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
