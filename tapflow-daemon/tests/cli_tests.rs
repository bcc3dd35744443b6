//! CLI parsing tests.

use clap::Parser;
use tapflow_daemon::cli::DaemonCli;

#[test]
fn test_defaults() {
    let cli = DaemonCli::try_parse_from(["tapflow-daemon"]).unwrap();
    assert_eq!(cli.config.to_str(), Some("/etc/tapflow/tapflow.toml"));
    assert!(cli.input.is_none());
    assert!(!cli.validate);
}

#[test]
fn test_overrides() {
    let cli = DaemonCli::try_parse_from([
        "tapflow-daemon",
        "-c",
        "/tmp/t.toml",
        "--input",
        "records.jsonl",
        "--log-level",
        "debug",
        "--log-format",
        "pretty",
        "--validate",
    ])
    .unwrap();
    assert_eq!(cli.config.to_str(), Some("/tmp/t.toml"));
    assert_eq!(cli.input.unwrap().to_str(), Some("records.jsonl"));
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert_eq!(cli.log_format.as_deref(), Some("pretty"));
    assert!(cli.validate);
}

#[test]
fn test_unknown_flag_is_rejected() {
    assert!(DaemonCli::try_parse_from(["tapflow-daemon", "--pid-file", "x"]).is_err());
}
