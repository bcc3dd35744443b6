//! 모듈 결함 격리 테스트
//!
//! 패닉하거나 에러를 반환하는 추출기가 해당 레코드에만 영향을 주고
//! 이후 레코드 처리는 정상적으로 이어지는지 검증합니다.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Value, json};

use tapflow_core::diagnostics::Diagnostics;
use tapflow_core::error::ExtractError;
use tapflow_core::record::Record;
use tapflow_stream_processor::modules::{FAMILY_LOGS, LINUX_SYSTEM, LinuxSystemLogs};
use tapflow_stream_processor::{
    Dispatcher, LogExtraction, LogExtractor, LogsProcessor, LogsSettings, MemoryCache,
    ModuleRegistry, Toolset,
};

struct Panicking;

impl LogExtractor for Panicking {
    fn extract(&self, _: &Record, diag: &mut Diagnostics) -> Result<LogExtraction, ExtractError> {
        diag.note("never surfaces");
        panic!("extractor exploded");
    }
}

struct Failing;

impl LogExtractor for Failing {
    fn extract(&self, _: &Record, _: &mut Diagnostics) -> Result<LogExtraction, ExtractError> {
        Err(ExtractError::Module("upstream schema changed".to_owned()))
    }
}

fn setup() -> (Dispatcher, Arc<MemoryCache>) {
    let registry = ModuleRegistry::<dyn LogExtractor>::new(FAMILY_LOGS)
        .with(LINUX_SYSTEM, Arc::new(LinuxSystemLogs))
        .and_then(|r| r.with("panicking", Arc::new(Panicking)))
        .and_then(|r| r.with("failing", Arc::new(Failing)))
        .unwrap();
    let (tools, cache, _) = Toolset::in_memory();
    let processor = LogsProcessor::new(LogsSettings::default(), registry, tools);
    let dispatcher = Dispatcher::builder()
        .register(Arc::new(processor))
        .build()
        .unwrap();
    (dispatcher, cache)
}

/// 메시지 없는 레코드: 1단계 쓰기가 없으므로 결함 모듈만 관여
fn faulty(module: &str) -> Record {
    Record::new(json!({
        "origin": { "module": module },
        "log": { "file": { "path": "/var/log/faulty.log" } },
        "mesage": "would be written by the default extraction"
    }))
}

fn healthy(n: usize) -> Record {
    Record::new(json!({
        "message": format!("line {n}"),
        "log": { "file": { "path": "/var/log/healthy.log" } },
        "origin": { "module": "linux-system" }
    }))
}

#[test]
fn panicking_module_yields_one_note_and_no_writes() {
    let (dispatcher, cache) = setup();
    let report = dispatcher.dispatch("logs", &faulty("panicking")).unwrap();

    assert_eq!(report.cache_writes, 0);
    assert_eq!(report.notes().len(), 1);
    let note = &report.notes()[0];
    assert!(note.message.contains("extractor exploded"));
    let context = note.context.as_ref().unwrap();
    assert_eq!(context["record"]["origin"]["module"], Value::from("panicking"));
    assert!(cache.namespaces().is_empty());
}

#[test]
fn returned_error_yields_one_note_and_no_writes() {
    let (dispatcher, cache) = setup();
    let report = dispatcher.dispatch("logs", &faulty("failing")).unwrap();

    assert_eq!(report.cache_writes, 0);
    assert_eq!(report.notes().len(), 1);
    assert!(report.notes()[0].message.contains("upstream schema changed"));
    assert!(cache.namespaces().is_empty());
}

#[test]
fn later_records_are_processed_normally() {
    let (dispatcher, cache) = setup();
    dispatcher.dispatch("logs", &faulty("panicking"));
    let report = dispatcher.dispatch("logs", &healthy(1)).unwrap();

    assert!(report.notes().is_empty());
    // 도출 쓰기 + linux-system 모듈 쓰기
    assert_eq!(report.cache_writes, 2);
    assert_eq!(cache.namespaces(), vec!["logs:/var/log/healthy.log"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// 임의 순서로 섞인 결함/정상 레코드에서 결함은 항상 격리됨
    #[test]
    fn faults_never_leak_into_neighbours(pattern in prop::collection::vec(0u8..3, 1..24)) {
        let (dispatcher, cache) = setup();
        let mut expected_healthy = 0usize;

        for (n, kind) in pattern.iter().enumerate() {
            let record = match kind {
                0 => faulty("panicking"),
                1 => faulty("failing"),
                _ => healthy(n),
            };
            let report = dispatcher.dispatch("logs", &record).unwrap();
            if *kind < 2 {
                prop_assert_eq!(report.cache_writes, 0);
                prop_assert_eq!(report.notes().len(), 1);
            } else {
                expected_healthy += 1;
                prop_assert_eq!(report.cache_writes, 2);
                prop_assert!(report.notes().is_empty());
            }
        }

        prop_assert!(cache.stored_len("logs:/var/log/faulty.log") == 0);
        prop_assert_eq!(
            cache.stored_len("logs:/var/log/healthy.log"),
            (expected_healthy * 2).min(LogsSettings::default().retention.cap)
        );
    }
}
