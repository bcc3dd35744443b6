//! 도메인 타입 -- 파이프라인이 생성하는 파생 엔티티
//!
//! 원시 [`Record`](crate::record::Record)에서 파생되는 이벤트, 로그 라인,
//! 인벤토리 조각과 처리 결과 보고서를 정의합니다.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::{Diagnostics, Note};
use crate::error::ExtractError;
use crate::record::Record;

// --- 토픽명 상수 ---

/// 이벤트 토픽
pub const TOPIC_EVENTS: &str = "events";
/// 로그 토픽
pub const TOPIC_LOGS: &str = "logs";
/// 감사 토픽
pub const TOPIC_AUDIT: &str = "audit";
/// 메트릭 토픽
pub const TOPIC_METRICS: &str = "metrics";
/// 인벤토리 토픽
pub const TOPIC_INVENTORY: &str = "inventory";

/// 인벤토리 조각 전파에 필요한 최소 필드 수 (이 값을 초과해야 함)
pub const ADMISSION_THRESHOLD: usize = 5;

/// 이벤트 제목 기본값
pub const UNTITLED_EVENT: &str = "Audit event without a title";

/// 호스트 ID의 짧은 표기를 반환합니다.
///
/// 첫 번째 `-` 구분 세그먼트를 최대 8자까지 사용합니다.
/// UUID 형식의 호스트 ID는 첫 블록만 남습니다.
pub fn short_id(id: &str) -> &str {
    let head = id.split('-').next().unwrap_or(id);
    match head.char_indices().nth(8) {
        Some((idx, _)) => &head[..idx],
        None => head,
    }
}

/// 감사 이벤트 요약
///
/// 시각, 호스트, 모듈, 원본 이벤트 ID와 선택적 사용자/프로세스/결과/데이터를 담습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// 이벤트 발생 시각
    pub time: DateTime<Utc>,
    /// 호스트 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// 생성 모듈
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// 원본 이벤트 ID (`audit.<id>`)
    pub sid: String,
    /// 사용자 (잡음 필드 제거됨)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    /// 프로세스
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<Value>,
    /// auditd 결과
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// auditd 데이터
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// 파생 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 사람이 읽을 수 있는 요약
    pub title: String,
    /// `<module>.<action>` 형식 식별자
    #[serde(rename = "type")]
    pub event_type: String,
    /// 잔여 페이로드
    pub data: Value,
    /// 공통 요약
    pub summary: EventSummary,
}

impl Event {
    /// 요약과 액션으로 제목 없는 이벤트를 생성합니다.
    ///
    /// 모듈이 비어 있으면 `type`은 `unknown.<action>`이 됩니다.
    pub fn untitled(summary: EventSummary, action: &str) -> Self {
        let module = summary.module.as_deref().unwrap_or("unknown");
        Self {
            title: UNTITLED_EVENT.to_owned(),
            event_type: format!("{module}.{action}"),
            data: summary
                .data
                .clone()
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            summary,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.event_type, self.title, self.summary.sid)
    }
}

/// 로그셋에 묶인 로그 라인
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// 그룹 키
    pub logset: String,
    /// 로그 본문
    pub line: String,
    /// 원시 레코드
    pub record: Record,
}

/// 설치된 패키지 참조
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageRef {
    /// 패키지명
    pub name: String,
    /// 버전
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// 호스트 인벤토리 조각
///
/// 여러 소스(메트릭, 감사)에서 들어온 부분 정보를 담습니다.
/// `id`는 항상 비어있지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryHostFragment {
    /// 호스트 ID
    pub id: String,
    /// 호스트명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// FQDN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    /// 아키텍처
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// 전체 메모리 (바이트)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// 정규화된 IP 주소
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub ip: BTreeSet<String>,
    /// 정규화된 MAC 주소
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub mac: BTreeSet<String>,
    /// 운영체제 정보
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Value>,
    /// CPU 코어 수
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<u64>,
    /// 누적된 기존 패키지
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub packages: BTreeSet<PackageRef>,
}

impl InventoryHostFragment {
    /// ID만 채워진 조각을 생성합니다.
    pub fn new(id: impl Into<String>) -> Result<Self, ExtractError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ExtractError::MissingField("host.id".to_owned()));
        }
        Ok(Self {
            id,
            ..Self::default()
        })
    }

    /// 채워진 최상위 필드 수 (`id` 포함, 빈 집합 제외)
    pub fn populated_fields(&self) -> usize {
        1 + usize::from(self.name.is_some())
            + usize::from(self.fqdn.is_some())
            + usize::from(self.arch.is_some())
            + usize::from(self.memory.is_some())
            + usize::from(!self.ip.is_empty())
            + usize::from(!self.mac.is_empty())
            + usize::from(self.os.is_some())
            + usize::from(self.cores.is_some())
            + usize::from(!self.packages.is_empty())
    }

    /// 전파 임계값을 넘는지 확인합니다.
    pub fn is_sufficient(&self) -> bool {
        self.populated_fields() > ADMISSION_THRESHOLD
    }

    /// 패키지 누적 조각인지 확인합니다.
    pub fn is_package_fragment(&self) -> bool {
        !self.packages.is_empty()
    }

    /// 인벤토리 업데이트로 전파해야 하는지 확인합니다.
    pub fn should_propagate(&self) -> bool {
        self.is_sufficient() || self.is_package_fragment()
    }
}

/// 인벤토리 업데이트 출처 표식
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryOrigin {
    /// 항상 `true`
    pub inventory_update: bool,
    /// 조각을 만든 모듈
    pub module: String,
}

/// 하류 저장소로 보내는 인벤토리 업데이트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    /// 호스트 조각
    pub host: InventoryHostFragment,
    /// 출처
    pub origin: InventoryOrigin,
}

impl InventoryUpdate {
    /// 모듈 태그와 함께 업데이트를 생성합니다.
    pub fn new(host: InventoryHostFragment, module: impl Into<String>) -> Self {
        Self {
            host,
            origin: InventoryOrigin {
                inventory_update: true,
                module: module.into(),
            },
        }
    }
}

/// 레코드 한 건의 처리 결과
///
/// 토픽 핸들러는 부수 효과(캐시, 인벤토리 싱크)를 직접 수행하고,
/// 그 결과와 진단 노트, 파생 엔티티를 이 보고서에 기록합니다.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
    /// 처리한 프로세서 이름
    pub processor: String,
    /// 진단 노트
    pub diagnostics: Diagnostics,
    /// 파생 이벤트
    pub events: Vec<Event>,
    /// 이벤트화된 로그 라인
    pub log_lines: Vec<LogLine>,
    /// 캐시 쓰기 횟수
    pub cache_writes: usize,
    /// 생성된 인벤토리 업데이트 수
    pub inventory_updates: usize,
    /// 호스트 싱크로 전달된 레코드 수
    pub host_updates: usize,
}

impl ProcessReport {
    /// 프로세서 이름으로 빈 보고서를 생성합니다.
    pub fn new(processor: impl Into<String>) -> Self {
        Self {
            processor: processor.into(),
            ..Self::default()
        }
    }

    /// 수집된 노트 목록
    pub fn notes(&self) -> &[Note] {
        self.diagnostics.notes()
    }
}
