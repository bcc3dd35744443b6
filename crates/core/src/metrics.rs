//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tapflow_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(tapflow_core::metrics::RECORDS_DISPATCHED_TOTAL, "topic" => "logs").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 토픽 레이블 키
pub const LABEL_TOPIC: &str = "topic";

/// 모듈 레이블 키
pub const LABEL_MODULE: &str = "module";

/// 프로세서 레이블 키
pub const LABEL_PROCESSOR: &str = "processor";

// ─── Dispatcher 메트릭 ─────────────────────────────────────────────

/// 디스패치된 레코드 수 (counter, label: topic)
pub const RECORDS_DISPATCHED_TOTAL: &str = "tapflow_records_dispatched_total";

/// 구독 핸들러가 없어 버려진 레코드 수 (counter, label: topic)
pub const RECORDS_UNROUTED_TOTAL: &str = "tapflow_records_unrouted_total";

/// 레코드 처리 지연 시간 (histogram, 초, label: processor)
pub const PROCESSING_DURATION_SECONDS: &str = "tapflow_processing_duration_seconds";

// ─── Module 메트릭 ─────────────────────────────────────────────────

/// 모듈 추출기 결함 수 (counter, label: module)
pub const MODULE_FAULTS_TOTAL: &str = "tapflow_module_faults_total";

/// 진단 노트 수 (counter, label: processor)
pub const NOTES_TOTAL: &str = "tapflow_notes_total";

// ─── 출력 메트릭 ───────────────────────────────────────────────────

/// 캐시 쓰기 수 (counter, label: processor)
pub const CACHE_WRITES_TOTAL: &str = "tapflow_cache_writes_total";

/// TTL 만료로 제거된 캐시 엔트리 수 (counter)
pub const CACHE_EXPIRED_TOTAL: &str = "tapflow_cache_expired_total";

/// 생성된 인벤토리 업데이트 수 (counter)
pub const INVENTORY_UPDATES_TOTAL: &str = "tapflow_inventory_updates_total";

/// 파생 이벤트 수 (counter)
pub const EVENTS_DERIVED_TOTAL: &str = "tapflow_events_derived_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// 파싱에 실패한 입력 라인 수 (counter)
pub const DAEMON_MALFORMED_INPUT_TOTAL: &str = "tapflow_daemon_malformed_input_total";

/// 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "tapflow_daemon_uptime_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 레코드 처리 지연 시간 히스토그램 버킷 (초)
///
/// 레코드 한 건은 동기 변환이므로 10us ~ 100ms 범위
pub const PROCESSING_DURATION_BUCKETS: [f64; 8] =
    [0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.1];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        RECORDS_DISPATCHED_TOTAL,
        "Total number of records routed to a topic processor"
    );
    describe_counter!(
        RECORDS_UNROUTED_TOTAL,
        "Total number of records received on a topic with no subscribed processor"
    );
    describe_histogram!(
        PROCESSING_DURATION_SECONDS,
        "Time to process a single record in seconds"
    );
    describe_counter!(
        MODULE_FAULTS_TOTAL,
        "Total number of module extractor faults (errors and panics)"
    );
    describe_counter!(
        NOTES_TOTAL,
        "Total number of diagnostic notes emitted by processors"
    );
    describe_counter!(
        CACHE_WRITES_TOTAL,
        "Total number of cache namespace writes"
    );
    describe_counter!(
        CACHE_EXPIRED_TOTAL,
        "Total number of cache entries removed after their TTL elapsed"
    );
    describe_counter!(
        INVENTORY_UPDATES_TOTAL,
        "Total number of inventory updates produced"
    );
    describe_counter!(
        EVENTS_DERIVED_TOTAL,
        "Total number of events derived from audit records"
    );
    describe_counter!(
        DAEMON_MALFORMED_INPUT_TOTAL,
        "Total number of input lines that could not be parsed as envelopes"
    );
    describe_gauge!(DAEMON_UPTIME_SECONDS, "tapflow daemon uptime in seconds");
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        RECORDS_DISPATCHED_TOTAL,
        RECORDS_UNROUTED_TOTAL,
        PROCESSING_DURATION_SECONDS,
        MODULE_FAULTS_TOTAL,
        NOTES_TOTAL,
        CACHE_WRITES_TOTAL,
        CACHE_EXPIRED_TOTAL,
        INVENTORY_UPDATES_TOTAL,
        EVENTS_DERIVED_TOTAL,
        DAEMON_MALFORMED_INPUT_TOTAL,
        DAEMON_UPTIME_SECONDS,
    ];

    #[test]
    fn all_metrics_start_with_tapflow_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("tapflow_"),
                "Metric '{}' does not start with 'tapflow_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        let counters = ALL_METRIC_NAMES
            .iter()
            .filter(|n| !n.ends_with("_seconds"));
        for name in counters {
            assert!(name.ends_with("_total"), "counter '{}' lacks _total", name);
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        // 레코더 없이 호출해도 패닉하지 않아야 함
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        for label in [LABEL_TOPIC, LABEL_MODULE, LABEL_PROCESSOR] {
            assert_eq!(label.to_lowercase(), label);
        }
    }

    #[test]
    fn processing_duration_buckets_are_sorted() {
        let buckets = PROCESSING_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(buckets[i] > buckets[i - 1]);
        }
    }
}
