//! tapflow 스트림 프로세서
//!
//! 토픽별 레코드를 캐싱하고, 정규화하고, 이벤트와 인벤토리 업데이트로 변환합니다.
//!
//! # 모듈 구성
//!
//! - [`dispatcher`]: 토픽 → 프로세서 라우팅, 구독 검증
//! - [`processor`]: events / logs / inventory 토픽 핸들러
//! - [`modules`]: `origin.module` 태그별 추출기 (`linux-system`)
//! - [`registry`]: 추출기 레지스트리와 결함 격리
//! - [`normalize`]: IP/MAC 주소 정규화
//! - [`logset`]: 로그셋 키 도출
//! - [`cache`]: 네임스페이스별 용량/TTL 캐시
//! - [`toolset`]: 핸들러 공유 서비스
//! - [`config`]: 프로세서 런타임 설정 (core 설정 파생)
//! - [`error`]: 빌드 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! (topic, Record) -> Dispatcher -> TopicProcessor -> ModuleRegistry -> extractor
//!                                      |                                  |
//!                                  Toolset (cache, inventory, hosts)   Diagnostics
//!                                      |
//!                                 ProcessReport
//! ```

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logset;
pub mod modules;
pub mod normalize;
pub mod processor;
pub mod registry;
pub mod toolset;

// --- 주요 타입 re-export ---

// 디스패처
pub use dispatcher::{Dispatcher, DispatcherBuilder};

// 설정
pub use config::{
    AuditSettings, EventsSettings, InventorySettings, LogsSettings, StreamConfig, StreamConfigBuilder,
};

// 에러
pub use error::StreamProcessorError;

// 프로세서
pub use processor::{EventsProcessor, InventoryProcessor, LogsProcessor};

// 추출기
pub use modules::{AuditExtractor, InventoryExtractor, LogExtraction, LogExtractor};
pub use registry::{Invocation, ModuleRegistry};

// 서비스
pub use cache::MemoryCache;
pub use toolset::{MemorySink, Toolset};

// 정규화
pub use normalize::{normalize_ip, normalize_mac};
