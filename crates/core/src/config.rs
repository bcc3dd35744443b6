//! 설정 관리 -- tapflow.toml 파싱 및 런타임 설정
//!
//! [`TapflowConfig`]는 모든 프로세서의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`TAPFLOW_LOGS_CAP=50` 형식)
//! 3. 설정 파일 (`tapflow.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), tapflow_core::error::TapflowError> {
//! use tapflow_core::config::TapflowConfig;
//!
//! let config = TapflowConfig::load("tapflow.toml").await?;
//! let config = TapflowConfig::parse("[logs]\ncap = 50")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, TapflowError};
use crate::types::{TOPIC_AUDIT, TOPIC_EVENTS, TOPIC_INVENTORY, TOPIC_LOGS, TOPIC_METRICS};

/// 로그 TTL 상한 (시간). 30일.
const MAX_TTL_HOURS: u64 = 24 * 30;

/// tapflow 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TapflowConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 이벤트 프로세서 설정
    #[serde(default)]
    pub events: EventsConfig,
    /// 로그 프로세서 설정
    #[serde(default)]
    pub logs: LogsConfig,
    /// 인벤토리 프로세서 설정
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// 감사 이벤트 추출 설정
    #[serde(default)]
    pub audit: AuditConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl TapflowConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TapflowError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, TapflowError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TapflowError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                TapflowError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, TapflowError> {
        toml::from_str(toml_str).map_err(|e| {
            TapflowError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `TAPFLOW_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "TAPFLOW_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "TAPFLOW_GENERAL_LOG_FORMAT");

        // Events
        override_bool(&mut self.events.enabled, "TAPFLOW_EVENTS_ENABLED");
        override_csv(&mut self.events.topics, "TAPFLOW_EVENTS_TOPICS");
        override_bool(&mut self.events.cache, "TAPFLOW_EVENTS_CACHE");
        override_usize(&mut self.events.cap, "TAPFLOW_EVENTS_CAP");
        override_bool(
            &mut self.events.log_unhandled,
            "TAPFLOW_EVENTS_LOG_UNHANDLED",
        );

        // Logs
        override_bool(&mut self.logs.enabled, "TAPFLOW_LOGS_ENABLED");
        override_csv(&mut self.logs.topics, "TAPFLOW_LOGS_TOPICS");
        override_bool(&mut self.logs.cache, "TAPFLOW_LOGS_CACHE");
        override_usize(&mut self.logs.cap, "TAPFLOW_LOGS_CAP");
        override_u64(&mut self.logs.ttl, "TAPFLOW_LOGS_TTL");
        override_bool(&mut self.logs.eventify, "TAPFLOW_LOGS_EVENTIFY");
        override_bool(&mut self.logs.log_unhandled, "TAPFLOW_LOGS_LOG_UNHANDLED");

        // Inventory
        override_bool(&mut self.inventory.enabled, "TAPFLOW_INVENTORY_ENABLED");
        override_csv(&mut self.inventory.topics, "TAPFLOW_INVENTORY_TOPICS");
        override_csv(
            &mut self.inventory.ignored_audit_actions,
            "TAPFLOW_INVENTORY_IGNORED_AUDIT_ACTIONS",
        );

        // Audit
        override_bool(&mut self.audit.trace_actions, "TAPFLOW_AUDIT_TRACE_ACTIONS");
        override_csv(&mut self.audit.quiet_actions, "TAPFLOW_AUDIT_QUIET_ACTIONS");

        // Metrics
        override_bool(&mut self.metrics.enabled, "TAPFLOW_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "TAPFLOW_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "TAPFLOW_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TapflowError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.events.enabled {
            validate_topics("events.topics", &self.events.topics)?;
            if self.events.cap == 0 {
                return Err(invalid("events.cap", "must be greater than 0"));
            }
        }

        if self.logs.enabled {
            validate_topics("logs.topics", &self.logs.topics)?;
            if self.logs.cap == 0 {
                return Err(invalid("logs.cap", "must be greater than 0"));
            }
            if self.logs.ttl == 0 || self.logs.ttl > MAX_TTL_HOURS {
                return Err(invalid(
                    "logs.ttl",
                    format!("must be between 1 and {MAX_TTL_HOURS} hours"),
                ));
            }
        }

        if self.inventory.enabled {
            validate_topics("inventory.topics", &self.inventory.topics)?;
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(invalid("metrics.port", "must be greater than 0"));
            }
            if !self.metrics.endpoint.starts_with('/') {
                return Err(invalid("metrics.endpoint", "must start with '/'"));
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 이벤트 프로세서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 구독 토픽
    pub topics: Vec<String>,
    /// 원시 이벤트 캐싱 여부
    pub cache: bool,
    /// `events` 네임스페이스 용량
    pub cap: usize,
    /// 처리되지 않은 레코드를 노트로 남길지 여부
    pub log_unhandled: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec![TOPIC_EVENTS.to_owned()],
            cache: true,
            cap: 250,
            log_unhandled: false,
        }
    }
}

/// 로그 프로세서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 구독 토픽
    pub topics: Vec<String>,
    /// 로그 라인 캐싱 여부
    pub cache: bool,
    /// 로그셋별 용량
    pub cap: usize,
    /// 캐시 TTL (시간)
    pub ttl: u64,
    /// 캐시된 라인을 보고서에 이벤트로 실을지 여부
    pub eventify: bool,
    /// 처리되지 않은 레코드를 노트로 남길지 여부
    pub log_unhandled: bool,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec![TOPIC_LOGS.to_owned()],
            cache: true,
            cap: 25,
            ttl: 4,
            eventify: true,
            log_unhandled: false,
        }
    }
}

/// 인벤토리 프로세서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 구독 토픽
    pub topics: Vec<String>,
    /// 노트 없이 무시할 감사 액션
    pub ignored_audit_actions: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec![
                TOPIC_AUDIT.to_owned(),
                TOPIC_INVENTORY.to_owned(),
                TOPIC_METRICS.to_owned(),
            ],
            ignored_audit_actions: vec![
                "changed-audit-configuration".to_owned(),
                "existing_user".to_owned(),
                "network_flow".to_owned(),
            ],
        }
    }
}

/// 감사 이벤트 추출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 액션별 추적 노트 활성화
    pub trace_actions: bool,
    /// 추적 노트를 남기지 않을 액션
    pub quiet_actions: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            trace_actions: true,
            quiet_actions: [
                "existing_user",
                "ended-session",
                "started-session",
                "disposed-credentials",
                "refreshed-credentials",
                "ran-command",
                "deleted-group-account-from",
                "added-group-account-to",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
    /// 노출 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> TapflowError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

fn validate_topics(field: &str, topics: &[String]) -> Result<(), TapflowError> {
    if topics.is_empty() {
        return Err(invalid(field, "enabled processor must subscribe to at least one topic"));
    }
    if topics.iter().any(|t| t.trim().is_empty()) {
        return Err(invalid(field, "topic names must not be empty"));
    }
    Ok(())
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, kind: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                kind,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
