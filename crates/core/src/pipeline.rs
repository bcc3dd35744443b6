//! 파이프라인 trait -- 토픽 핸들러와 외부 협력자 경계 정의
//!
//! [`TopicProcessor`]는 토픽 핸들러의 확장 포인트이고,
//! [`CacheStore`], [`InventoryProducer`], [`HostInventory`]는
//! 코어가 소비하기만 하는 외부 기능 인터페이스입니다.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::types::{InventoryUpdate, LogLine, ProcessReport};

/// 프로세서 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    /// 프로세서 고유 이름 (예: `"logs"`)
    pub name: String,
    /// 표시 제목
    pub title: String,
    /// 설명
    pub about: String,
    /// 기본 구독 토픽
    pub default_topics: Vec<String>,
}

impl fmt::Display for ProcessorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.default_topics.join(", "))
    }
}

/// 토픽 핸들러 trait
///
/// 레코드 처리는 동기 변환이며 실패하지 않습니다.
/// 이상 상황은 `report.diagnostics`에 노트로 남깁니다.
pub trait TopicProcessor: Send + Sync {
    /// 프로세서 메타데이터
    fn info(&self) -> &ProcessorInfo;

    /// 구독 토픽 목록
    fn topics(&self) -> &[String];

    /// 레코드 한 건을 처리합니다.
    fn process(&self, topic: &str, record: &Record, report: &mut ProcessReport);
}

/// 캐시 네임스페이스 보존 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// 네임스페이스당 최대 엔트리 수
    pub cap: usize,
    /// 엔트리 수명 (`None`이면 만료 없음)
    pub ttl: Option<Duration>,
}

impl RetentionPolicy {
    /// 용량만 제한하는 정책
    pub fn capped(cap: usize) -> Self {
        Self { cap, ttl: None }
    }

    /// 용량과 수명을 함께 제한하는 정책
    pub fn capped_with_ttl(cap: usize, ttl: Duration) -> Self {
        Self { cap, ttl: Some(ttl) }
    }
}

/// 캐시에 저장되는 값
#[derive(Debug, Clone, PartialEq)]
pub enum CachePayload {
    /// 원시 레코드 (`events` 네임스페이스)
    Record(Record),
    /// 로그 라인 (`logs:<logset>` 네임스페이스)
    Line(LogLine),
}

/// 캐시 엔트리
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// 기록 시각
    pub written_at: Instant,
    /// 저장된 값
    pub payload: CachePayload,
}

impl CacheEntry {
    /// 주어진 시각 기준으로 만료되었는지 확인합니다.
    pub fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.written_at) >= ttl,
            None => false,
        }
    }
}

/// 캐시 저장소 인터페이스
///
/// 같은 네임스페이스에 대한 쓰기는 직렬화되어야 하며,
/// 서로 다른 네임스페이스는 독립적으로 진행될 수 있어야 합니다.
pub trait CacheStore: Send + Sync {
    /// 네임스페이스에 값을 추가합니다. 용량 초과 시 가장 오래된 엔트리를 제거합니다.
    fn push(&self, namespace: &str, payload: CachePayload, policy: RetentionPolicy);

    /// 만료되지 않은 엔트리를 오래된 순서로 반환합니다.
    fn entries(&self, namespace: &str) -> Vec<CacheEntry>;

    /// 네임스페이스를 제거합니다.
    fn clear(&self, namespace: &str);
}

/// 인벤토리 업데이트 생산자 (외부 협력자)
pub trait InventoryProducer: Send + Sync {
    /// 인벤토리 업데이트를 하류로 내보냅니다.
    fn produce_inventory_update(&self, update: InventoryUpdate);
}

/// 호스트 인벤토리 갱신 싱크 (외부 협력자)
pub trait HostInventory: Send + Sync {
    /// 인벤토리 토픽의 레코드로 호스트 정보를 갱신합니다.
    fn update_host(&self, record: &Record);
}
