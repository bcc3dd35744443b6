//! 스트림 프로세서 설정
//!
//! [`StreamConfig`]는 core의 [`TapflowConfig`](tapflow_core::config::TapflowConfig)에서
//! 프로세서별 런타임 설정을 파생합니다. 캐시 용량과 TTL은 이 단계에서
//! [`RetentionPolicy`]로 변환됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use tapflow_core::config::TapflowConfig;
//! use tapflow_stream_processor::config::StreamConfig;
//!
//! let config = StreamConfig::from_core(&TapflowConfig::default())?;
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use tapflow_core::config::TapflowConfig;
use tapflow_core::pipeline::RetentionPolicy;
use tapflow_core::types::{TOPIC_AUDIT, TOPIC_EVENTS, TOPIC_INVENTORY, TOPIC_LOGS, TOPIC_METRICS};

use crate::error::StreamProcessorError;

const SECS_PER_HOUR: u64 = 3600;

/// 이벤트 프로세서 설정
#[derive(Debug, Clone, PartialEq)]
pub struct EventsSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// 구독 토픽
    pub topics: Vec<String>,
    /// 원시 이벤트 캐싱 여부
    pub cache: bool,
    /// `events` 네임스페이스 보존 정책
    pub retention: RetentionPolicy,
    /// 처리되지 않은 레코드 노트 여부
    pub log_unhandled: bool,
}

impl Default for EventsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec![TOPIC_EVENTS.to_owned()],
            cache: true,
            retention: RetentionPolicy::capped(250),
            log_unhandled: false,
        }
    }
}

/// 로그 프로세서 설정
#[derive(Debug, Clone, PartialEq)]
pub struct LogsSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// 구독 토픽
    pub topics: Vec<String>,
    /// 로그 라인 캐싱 여부
    pub cache: bool,
    /// `logs:<logset>` 네임스페이스 보존 정책
    pub retention: RetentionPolicy,
    /// 캐시된 라인을 보고서에 싣는지 여부
    pub eventify: bool,
    /// 처리되지 않은 레코드 노트 여부
    pub log_unhandled: bool,
}

impl Default for LogsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec![TOPIC_LOGS.to_owned()],
            cache: true,
            retention: RetentionPolicy::capped_with_ttl(25, Duration::from_secs(4 * SECS_PER_HOUR)),
            eventify: true,
            log_unhandled: false,
        }
    }
}

/// 인벤토리 프로세서 설정
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySettings {
    /// 활성화 여부
    pub enabled: bool,
    /// 구독 토픽
    pub topics: Vec<String>,
    /// 노트 없이 무시할 감사 액션
    pub ignored_audit_actions: BTreeSet<String>,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec![
                TOPIC_AUDIT.to_owned(),
                TOPIC_INVENTORY.to_owned(),
                TOPIC_METRICS.to_owned(),
            ],
            ignored_audit_actions: ["changed-audit-configuration", "existing_user", "network_flow"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// 감사 이벤트 추출 설정
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSettings {
    /// 액션별 추적 노트 활성화
    pub trace_actions: bool,
    /// 추적 노트를 남기지 않을 액션
    pub quiet_actions: BTreeSet<String>,
}

impl AuditSettings {
    fn from_core(core: &tapflow_core::config::AuditConfig) -> Self {
        Self {
            trace_actions: core.trace_actions,
            quiet_actions: core.quiet_actions.iter().cloned().collect(),
        }
    }

    /// 액션에 대해 추적 노트를 남겨야 하는지 확인합니다.
    pub fn should_trace(&self, action: &str) -> bool {
        self.trace_actions && !self.quiet_actions.contains(action)
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self::from_core(&tapflow_core::config::AuditConfig::default())
    }
}

/// 스트림 프로세서 통합 설정
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamConfig {
    /// 이벤트 프로세서
    pub events: EventsSettings,
    /// 로그 프로세서
    pub logs: LogsSettings,
    /// 인벤토리 프로세서
    pub inventory: InventorySettings,
    /// 감사 추출
    pub audit: AuditSettings,
}

impl StreamConfig {
    /// core 설정에서 스트림 프로세서 설정을 생성합니다.
    pub fn from_core(core: &TapflowConfig) -> Result<Self, StreamProcessorError> {
        let config = Self {
            events: EventsSettings {
                enabled: core.events.enabled,
                topics: core.events.topics.clone(),
                cache: core.events.cache,
                retention: RetentionPolicy::capped(core.events.cap),
                log_unhandled: core.events.log_unhandled,
            },
            logs: LogsSettings {
                enabled: core.logs.enabled,
                topics: core.logs.topics.clone(),
                cache: core.logs.cache,
                retention: RetentionPolicy::capped_with_ttl(
                    core.logs.cap,
                    Duration::from_secs(core.logs.ttl.saturating_mul(SECS_PER_HOUR)),
                ),
                eventify: core.logs.eventify,
                log_unhandled: core.logs.log_unhandled,
            },
            inventory: InventorySettings {
                enabled: core.inventory.enabled,
                topics: core.inventory.topics.clone(),
                ignored_audit_actions: core.inventory.ignored_audit_actions.iter().cloned().collect(),
            },
            audit: AuditSettings::from_core(&core.audit),
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), StreamProcessorError> {
        if self.events.enabled {
            validate_retention("events", self.events.retention)?;
        }
        if self.logs.enabled {
            validate_retention("logs", self.logs.retention)?;
        }
        Ok(())
    }
}

fn validate_retention(namespace: &str, policy: RetentionPolicy) -> Result<(), StreamProcessorError> {
    if policy.cap == 0 {
        return Err(StreamProcessorError::InvalidRetention {
            namespace: namespace.to_owned(),
            reason: "cap must be greater than 0".to_owned(),
        });
    }
    if policy.ttl.is_some_and(|ttl| ttl.is_zero()) {
        return Err(StreamProcessorError::InvalidRetention {
            namespace: namespace.to_owned(),
            reason: "ttl must be greater than 0".to_owned(),
        });
    }
    Ok(())
}

/// 스트림 프로세서 설정 빌더
#[derive(Debug, Default)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    /// 기본값으로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 이벤트 캐시 용량
    pub fn events_cap(mut self, cap: usize) -> Self {
        self.config.events.retention.cap = cap;
        self
    }

    /// 이벤트 캐싱 여부
    pub fn events_cache(mut self, cache: bool) -> Self {
        self.config.events.cache = cache;
        self
    }

    /// 이벤트 미처리 노트 여부
    pub fn events_log_unhandled(mut self, enabled: bool) -> Self {
        self.config.events.log_unhandled = enabled;
        self
    }

    /// 로그셋당 용량
    pub fn logs_cap(mut self, cap: usize) -> Self {
        self.config.logs.retention.cap = cap;
        self
    }

    /// 로그 캐시 TTL
    pub fn logs_ttl(mut self, ttl: Duration) -> Self {
        self.config.logs.retention.ttl = Some(ttl);
        self
    }

    /// 로그 캐싱 여부
    pub fn logs_cache(mut self, cache: bool) -> Self {
        self.config.logs.cache = cache;
        self
    }

    /// 로그 eventify 여부
    pub fn logs_eventify(mut self, eventify: bool) -> Self {
        self.config.logs.eventify = eventify;
        self
    }

    /// 로그 미처리 노트 여부
    pub fn logs_log_unhandled(mut self, enabled: bool) -> Self {
        self.config.logs.log_unhandled = enabled;
        self
    }

    /// 감사 액션 추적 노트 여부
    pub fn trace_audit_actions(mut self, enabled: bool) -> Self {
        self.config.audit.trace_actions = enabled;
        self
    }

    /// 프로세서 활성화 여부
    pub fn enable(mut self, events: bool, logs: bool, inventory: bool) -> Self {
        self.config.events.enabled = events;
        self.config.logs.enabled = logs;
        self.config.inventory.enabled = inventory;
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<StreamConfig, StreamProcessorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
