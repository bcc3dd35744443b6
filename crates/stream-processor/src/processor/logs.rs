//! 로그 토픽 핸들러
//!
//! 레코드 한 건을 다음 순서로 처리합니다.
//!
//! 1. `message`가 있으면 로그셋을 도출해 `logs:<logset>`에 캐싱
//!    (도출 실패 시 노트를 남기고 쓰기만 건너뜀)
//! 2. 1단계 결과와 무관하게 로그 레지스트리의 모듈 추출 결과를 캐싱
//! 3. 모듈이 없거나 쓸 수 있는 쌍을 주지 못하면 기본 추출 적용
//!
//! 1단계와 2단계는 서로 독립적이므로, 모듈이 같은 쌍을 돌려주면 같은 라인이 두 번 캐싱됩니다.

use serde_json::json;
use tapflow_core::metrics as m;
use tapflow_core::pipeline::{CachePayload, ProcessorInfo, TopicProcessor};
use tapflow_core::record::Record;
use tapflow_core::types::{LogLine, ProcessReport, TOPIC_LOGS};

use super::{note_record, processor_info};
use crate::config::LogsSettings;
use crate::error::StreamProcessorError;
use crate::logset;
use crate::modules::{LogExtraction, LogExtractor, logs_registry};
use crate::registry::{Invocation, ModuleRegistry};
use crate::toolset::Toolset;

/// 프로세서 이름
pub const NAME: &str = "logs";

/// 기본 추출이 읽는 본문 필드.
///
/// `message`가 아니라 `mesage`를 읽습니다. 기존 동작을 유지하며 테스트로 고정되어 있습니다.
pub const DEFAULT_LINE_PATH: &str = "mesage";

/// 기본 추출: `(log.file.path, mesage)`
pub fn default_extraction(record: &Record) -> LogExtraction {
    LogExtraction {
        logset: logset::from_file(record),
        line: record.str_at(DEFAULT_LINE_PATH).map(str::to_owned),
    }
}

/// 로그 스트림 프로세서
pub struct LogsProcessor {
    info: ProcessorInfo,
    settings: LogsSettings,
    modules: ModuleRegistry<dyn LogExtractor>,
    tools: Toolset,
}

impl LogsProcessor {
    pub fn new(settings: LogsSettings, modules: ModuleRegistry<dyn LogExtractor>, tools: Toolset) -> Self {
        let info = processor_info(
            NAME,
            "Log stream processor",
            "Caches recent log data per logset and eventifies it for event-driven automation.",
            &[TOPIC_LOGS],
        );
        Self {
            info,
            settings,
            modules,
            tools,
        }
    }

    /// 기본 로그 레지스트리로 생성합니다.
    pub fn with_defaults(settings: LogsSettings, tools: Toolset) -> Result<Self, StreamProcessorError> {
        Ok(Self::new(settings, logs_registry()?, tools))
    }

    /// 로그 라인 한 건을 캐싱합니다. 캐싱이 꺼져 있으면 아무것도 하지 않습니다.
    fn write(&self, logset: &str, line: &str, record: &Record, report: &mut ProcessReport) {
        if !self.settings.cache {
            return;
        }

        let entry = LogLine {
            logset: logset.to_owned(),
            line: line.to_owned(),
            record: record.clone(),
        };
        if self.settings.eventify {
            report.log_lines.push(entry.clone());
        }
        self.tools.cache.push(
            &logset::namespace(logset),
            CachePayload::Line(entry),
            self.settings.retention,
        );
        report.cache_writes += 1;
        metrics::counter!(m::CACHE_WRITES_TOTAL, m::LABEL_PROCESSOR => NAME).increment(1);
    }

    fn fallback(&self, label: &str, record: &Record, report: &mut ProcessReport) {
        let extraction = default_extraction(record);
        match extraction.usable() {
            Some((logset, line)) => self.write(logset, line, record, report),
            None => {
                if self.settings.log_unhandled {
                    note_record(report, format!("[logs] Cannot handle message ({label})"), record);
                }
            }
        }
    }
}

impl TopicProcessor for LogsProcessor {
    fn info(&self) -> &ProcessorInfo {
        &self.info
    }

    fn topics(&self) -> &[String] {
        &self.settings.topics
    }

    fn process(&self, _topic: &str, record: &Record, report: &mut ProcessReport) {
        if let Some(message) = record.message() {
            match logset::derive(record) {
                Some(logset) => self.write(&logset, message, record, report),
                None => report.diagnostics.note_with(
                    "Failed to extract logset from data",
                    json!({ "record": record.value() }),
                ),
            }
        }

        match self
            .modules
            .invoke(record, &mut report.diagnostics, |module, r, d| module.extract(r, d))
        {
            Invocation::Completed(extraction) => match extraction.usable() {
                Some((logset, line)) => self.write(logset, line, record, report),
                None => self.fallback("module", record, report),
            },
            Invocation::Faulted => {}
            Invocation::Unhandled => self.fallback("default", record, report),
        }
    }
}

impl std::fmt::Debug for LogsProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsProcessor")
            .field("settings", &self.settings)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tapflow_core::pipeline::CacheStore;

    use crate::cache::MemoryCache;

    fn processor(settings: LogsSettings) -> (LogsProcessor, Arc<MemoryCache>) {
        let (tools, cache, _) = Toolset::in_memory();
        (LogsProcessor::with_defaults(settings, tools).unwrap(), cache)
    }

    fn run(p: &LogsProcessor, value: serde_json::Value) -> ProcessReport {
        let mut report = ProcessReport::new(NAME);
        p.process(TOPIC_LOGS, &Record::new(value), &mut report);
        report
    }

    #[test]
    fn file_log_is_written_by_both_steps() {
        let (p, cache) = processor(LogsSettings::default());
        let report = run(
            &p,
            json!({
                "message": "Accepted publickey for bob",
                "log": { "file": { "path": "/var/log/auth.log" } },
                "origin": { "module": "linux-system" }
            }),
        );

        // 도출 쓰기와 모듈 쓰기가 각각 수행됨
        assert_eq!(report.cache_writes, 2);
        assert_eq!(cache.entries("logs:/var/log/auth.log").len(), 2);
        assert_eq!(report.log_lines.len(), 2);
        assert!(report.log_lines.iter().all(|l| l.line == "Accepted publickey for bob"));
        assert!(report.notes().is_empty());
    }

    #[test]
    fn journald_logset_namespace() {
        let (p, cache) = processor(LogsSettings::default());
        run(
            &p,
            json!({
                "message": "started",
                "input": { "type": "journald" },
                "syslog": { "identifier": "cron" }
            }),
        );
        assert_eq!(cache.namespaces(), vec!["logs:journald.syslog.cron"]);
    }

    #[test]
    fn underivable_logset_is_noted_and_skipped() {
        let (p, cache) = processor(LogsSettings::default());
        let report = run(&p, json!({ "message": "orphan line" }));
        assert_eq!(report.notes().len(), 1);
        assert_eq!(report.notes()[0].message, "Failed to extract logset from data");
        assert_eq!(report.cache_writes, 0);
        assert!(cache.namespaces().is_empty());
    }

    struct Tagged;

    impl LogExtractor for Tagged {
        fn extract(
            &self,
            record: &Record,
            _: &mut tapflow_core::diagnostics::Diagnostics,
        ) -> Result<LogExtraction, tapflow_core::error::ExtractError> {
            Ok(record
                .message()
                .map(|line| LogExtraction::pair("tagged", line))
                .unwrap_or_else(LogExtraction::none))
        }
    }

    #[test]
    fn module_still_runs_when_logset_cannot_be_derived() {
        let registry = ModuleRegistry::<dyn LogExtractor>::new("logs")
            .with("tagged", Arc::new(Tagged))
            .unwrap();
        let (tools, cache, _) = Toolset::in_memory();
        let p = LogsProcessor::new(LogsSettings::default(), registry, tools);

        let report = run(&p, json!({ "message": "orphan line", "origin": { "module": "tagged" } }));
        assert_eq!(report.notes()[0].message, "Failed to extract logset from data");
        assert_eq!(report.cache_writes, 1);
        assert_eq!(cache.namespaces(), vec!["logs:tagged"]);
    }

    #[test]
    fn default_extraction_reads_mesage_not_message() {
        let record = Record::new(json!({
            "message": "real body",
            "log": { "file": { "path": "/var/log/app.log" } }
        }));
        assert_eq!(default_extraction(&record).line, None);

        let record = Record::new(json!({
            "mesage": "misspelled body",
            "log": { "file": { "path": "/var/log/app.log" } }
        }));
        assert_eq!(
            default_extraction(&record).usable(),
            Some(("/var/log/app.log", "misspelled body"))
        );
    }

    #[test]
    fn unhandled_default_path_writes_mesage() {
        let (p, cache) = processor(LogsSettings::default());
        let report = run(
            &p,
            json!({
                "mesage": "from default",
                "log": { "file": { "path": "/var/log/app.log" } }
            }),
        );
        assert_eq!(report.cache_writes, 1);
        assert_eq!(cache.entries("logs:/var/log/app.log").len(), 1);
    }

    #[test]
    fn unhandled_note_labels() {
        let (p, _) = processor(LogsSettings {
            log_unhandled: true,
            ..LogsSettings::default()
        });

        let report = run(&p, json!({ "origin": { "module": "windows" } }));
        assert_eq!(report.notes()[0].message, "[logs] Cannot handle message (default)");

        let report = run(&p, json!({ "origin": { "module": "linux-system" } }));
        assert_eq!(report.notes()[0].message, "[logs] Cannot handle message (module)");
    }

    #[test]
    fn eventify_off_keeps_report_clean() {
        let (p, _) = processor(LogsSettings {
            eventify: false,
            ..LogsSettings::default()
        });
        let report = run(
            &p,
            json!({ "message": "x", "log": { "file": { "path": "/var/log/x" } } }),
        );
        assert_eq!(report.cache_writes, 1);
        assert!(report.log_lines.is_empty());
    }

    #[test]
    fn cache_disabled_writes_nothing() {
        let (p, cache) = processor(LogsSettings {
            cache: false,
            ..LogsSettings::default()
        });
        let report = run(
            &p,
            json!({ "message": "x", "log": { "file": { "path": "/var/log/x" } } }),
        );
        assert_eq!(report.cache_writes, 0);
        assert!(report.log_lines.is_empty());
        assert!(cache.namespaces().is_empty());
    }
}
