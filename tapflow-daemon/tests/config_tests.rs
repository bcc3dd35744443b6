//! Configuration loading through the orchestrator.

use std::io::Write;

use serial_test::serial;
use tapflow_core::config::TapflowConfig;
use tapflow_daemon::orchestrator::Orchestrator;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[tokio::test]
#[serial]
async fn test_build_from_file() {
    let file = write_config(
        r#"
[general]
log_level = "debug"

[logs]
cap = 10
ttl = 1
topics = ["logs", "syslog"]

[inventory]
enabled = false
"#,
    );
    let orchestrator = Orchestrator::build(file.path()).await.unwrap();
    assert_eq!(orchestrator.config().logs.cap, 10);
    assert_eq!(
        orchestrator.dispatcher().topics(),
        vec!["events", "logs", "syslog"]
    );
}

#[tokio::test]
#[serial]
async fn test_invalid_config_is_rejected() {
    let file = write_config("[events]\ncap = 0\n");
    let err = Orchestrator::build(file.path()).await.err().unwrap();
    assert!(err.to_string().contains("failed to load config"));
}

#[tokio::test]
#[serial]
async fn test_overlapping_topics_fail_build() {
    let file = write_config("[logs]\ntopics = [\"events\"]\n");
    let err = Orchestrator::build(file.path()).await.err().unwrap();
    assert!(err.to_string().contains("failed to build dispatcher"));
}

#[tokio::test]
#[serial]
async fn test_env_override_applies_on_load() {
    let file = write_config("");
    // SAFETY: serialized with #[serial]; no other thread reads the environment here
    unsafe { std::env::set_var("TAPFLOW_EVENTS_ENABLED", "false") };
    let result = Orchestrator::build(file.path()).await;
    unsafe { std::env::remove_var("TAPFLOW_EVENTS_ENABLED") };

    let orchestrator = result.unwrap();
    assert!(!orchestrator.dispatcher().topics().contains(&"events"));
}

#[test]
fn test_serialized_defaults_roundtrip_through_toml() {
    let text = toml::to_string(&TapflowConfig::default()).unwrap();
    let parsed = TapflowConfig::parse(&text).unwrap();
    assert_eq!(parsed.events.cap, 250);
    assert_eq!(parsed.logs.ttl, 4);
}
