//! tapflow 공통 크레이트
//!
//! 스트림 프로세서와 데몬이 공유하는 레코드 모델, 도메인 타입,
//! 파이프라인 trait, 에러, 설정, 메트릭 이름을 정의합니다.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, ExtractError, RegistryError, TapflowError};

// 설정
pub use config::TapflowConfig;

// 레코드와 진단
pub use diagnostics::{Diagnostics, Note};
pub use record::Record;

// 파이프라인 trait
pub use pipeline::{
    CacheEntry, CachePayload, CacheStore, HostInventory, InventoryProducer, ProcessorInfo,
    RetentionPolicy, TopicProcessor,
};

// 도메인 타입
pub use types::{
    Event, EventSummary, InventoryHostFragment, InventoryUpdate, LogLine, PackageRef,
    ProcessReport,
};
