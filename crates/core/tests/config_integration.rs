//! tapflow.toml 통합 설정 테스트
//!
//! - tapflow.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 파일 로딩과 환경변수 우선순위 테스트

use std::io::Write;

use tapflow_core::config::TapflowConfig;
use tapflow_core::error::{ConfigError, TapflowError};

const EXAMPLE: &str = include_str!("../../../tapflow.toml.example");

fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var(key, value) };
    let result = f();
    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

// =============================================================================
// tapflow.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let config = TapflowConfig::parse(EXAMPLE).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let example = TapflowConfig::parse(EXAMPLE).expect("should parse");
    let defaults = TapflowConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.events.cap, defaults.events.cap);
    assert_eq!(example.events.topics, defaults.events.topics);
    assert_eq!(example.logs.cap, defaults.logs.cap);
    assert_eq!(example.logs.ttl, defaults.logs.ttl);
    assert_eq!(example.logs.eventify, defaults.logs.eventify);
    assert_eq!(example.inventory.topics, defaults.inventory.topics);
    assert_eq!(
        example.inventory.ignored_audit_actions,
        defaults.inventory.ignored_audit_actions
    );
    assert_eq!(example.audit.quiet_actions, defaults.audit.quiet_actions);
    assert_eq!(example.metrics.port, defaults.metrics.port);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_single_section() {
    let config = TapflowConfig::parse("[events]\ncap = 10").expect("should parse");
    assert_eq!(config.events.cap, 10);
    assert!(config.events.cache);
    assert_eq!(config.logs.cap, 25);
}

#[test]
fn partial_config_disabled_processor() {
    let toml = r#"
[inventory]
enabled = false
topics = []
"#;
    let config = TapflowConfig::parse(toml).expect("should parse");
    assert!(!config.inventory.enabled);
    config.validate().expect("disabled processor skips topic check");
}

#[test]
fn custom_topic_names_are_accepted() {
    let config = TapflowConfig::parse("[logs]\ntopics = [\"syslog\", \"journal\"]")
        .expect("should parse");
    config.validate().expect("custom topics are valid");
    assert_eq!(config.logs.topics, vec!["syslog", "journal"]);
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn load_from_tempfile() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[logs]\nttl = 8\ncap = 5").expect("write");

    let config = TapflowConfig::from_file(file.path())
        .await
        .expect("should load");
    assert_eq!(config.logs.ttl, 8);
    assert_eq!(config.logs.cap, 5);
}

#[tokio::test]
async fn load_rejects_invalid_values_in_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[logs]\nttl = 0").expect("write");

    let err = TapflowConfig::from_file(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        TapflowError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn load_missing_file_is_not_found() {
    let err = TapflowConfig::load("/nonexistent/tapflow.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TapflowError::Config(ConfigError::FileNotFound { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let mut config = TapflowConfig::parse("[general]\nlog_level = \"info\"").expect("should parse");
    with_env("TAPFLOW_GENERAL_LOG_LEVEL", "error", || {
        config.apply_env_overrides();
    });
    assert_eq!(config.general.log_level, "error");
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_quiet_actions() {
    let mut config = TapflowConfig::parse("").expect("should parse");
    with_env(
        "TAPFLOW_AUDIT_QUIET_ACTIONS",
        "ran-command, started-session",
        || config.apply_env_overrides(),
    );
    assert_eq!(
        config.audit.quiet_actions,
        vec!["ran-command", "started-session"]
    );
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let mut config = TapflowConfig::parse("").expect("should parse");
    with_env("TAPFLOW_EVENTS_CAP", "999", || config.apply_env_overrides());
    assert_eq!(config.events.cap, 999);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_after_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[logs]\ncap = 5").expect("write");

    let original = std::env::var("TAPFLOW_LOGS_CAP").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("TAPFLOW_LOGS_CAP", "7") };
    let result = TapflowConfig::load(file.path()).await;
    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("TAPFLOW_LOGS_CAP", val),
            None => std::env::remove_var("TAPFLOW_LOGS_CAP"),
        }
    }

    assert_eq!(result.expect("should load").logs.cap, 7);
}
