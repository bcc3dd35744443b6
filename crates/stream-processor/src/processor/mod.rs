//! 토픽 핸들러
//!
//! 각 프로세서는 [`TopicProcessor`](tapflow_core::pipeline::TopicProcessor)를 구현하며
//! 설정, 모듈 레지스트리, 공유 [`Toolset`](crate::toolset::Toolset)을 보관합니다.
//!
//! | 프로세서 | 기본 토픽 | 부수 효과 |
//! |----------|-----------|-----------|
//! | [`EventsProcessor`] | `events` | `events` 캐시, 파생 이벤트 |
//! | [`LogsProcessor`] | `logs` | `logs:<logset>` 캐시, 이벤트화 라인 |
//! | [`InventoryProcessor`] | `audit`, `inventory`, `metrics` | 인벤토리 업데이트, 호스트 싱크 |

pub mod events;
pub mod inventory;
pub mod logs;

pub use events::EventsProcessor;
pub use inventory::InventoryProcessor;
pub use logs::LogsProcessor;

use serde_json::json;
use tapflow_core::pipeline::ProcessorInfo;
use tapflow_core::record::Record;
use tapflow_core::types::ProcessReport;

fn processor_info(name: &str, title: &str, about: &str, default_topics: &[&str]) -> ProcessorInfo {
    ProcessorInfo {
        name: name.to_owned(),
        title: title.to_owned(),
        about: about.to_owned(),
        default_topics: default_topics.iter().map(|t| (*t).to_owned()).collect(),
    }
}

/// 원시 레코드를 컨텍스트로 노트를 남깁니다.
fn note_record(report: &mut ProcessReport, message: impl Into<String>, record: &Record) {
    report
        .diagnostics
        .note_with(message, json!({ "record": record.value() }));
}
