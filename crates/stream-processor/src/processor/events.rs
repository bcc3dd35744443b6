//! 이벤트 토픽 핸들러

use tapflow_core::metrics as m;
use tapflow_core::pipeline::{CachePayload, ProcessorInfo, TopicProcessor};
use tapflow_core::record::Record;
use tapflow_core::types::{ProcessReport, TOPIC_EVENTS};

use super::{note_record, processor_info};
use crate::config::{AuditSettings, EventsSettings};
use crate::error::StreamProcessorError;
use crate::modules::{AuditExtractor, audit_registry};
use crate::registry::{Invocation, ModuleRegistry};
use crate::toolset::Toolset;

/// 프로세서 이름
pub const NAME: &str = "events";

/// 원시 이벤트 캐시 네임스페이스
pub const NAMESPACE: &str = "events";

/// 이벤트 스트림 프로세서
///
/// 원시 레코드를 캐싱하고, 감사 레지스트리로 파생 이벤트를 만듭니다.
pub struct EventsProcessor {
    info: ProcessorInfo,
    settings: EventsSettings,
    audit: ModuleRegistry<dyn AuditExtractor>,
    tools: Toolset,
}

impl EventsProcessor {
    pub fn new(
        settings: EventsSettings,
        audit: ModuleRegistry<dyn AuditExtractor>,
        tools: Toolset,
    ) -> Self {
        let info = processor_info(
            NAME,
            "Event data stream processor",
            "Caches recent events and derives titled events through module-specific logic.",
            &[TOPIC_EVENTS],
        );
        Self {
            info,
            settings,
            audit,
            tools,
        }
    }

    /// 기본 감사 레지스트리로 생성합니다.
    pub fn with_defaults(
        settings: EventsSettings,
        audit: &AuditSettings,
        tools: Toolset,
    ) -> Result<Self, StreamProcessorError> {
        Ok(Self::new(settings, audit_registry(audit)?, tools))
    }
}

impl TopicProcessor for EventsProcessor {
    fn info(&self) -> &ProcessorInfo {
        &self.info
    }

    fn topics(&self) -> &[String] {
        &self.settings.topics
    }

    fn process(&self, _topic: &str, record: &Record, report: &mut ProcessReport) {
        if self.settings.cache {
            self.tools.cache.push(
                NAMESPACE,
                CachePayload::Record(record.clone()),
                self.settings.retention,
            );
            report.cache_writes += 1;
            metrics::counter!(m::CACHE_WRITES_TOTAL, m::LABEL_PROCESSOR => NAME).increment(1);
        }

        if record.host_id().is_none() {
            note_record(report, "[event] Host lacks ID", record);
        }

        match self
            .audit
            .invoke(record, &mut report.diagnostics, |module, r, d| module.extract(r, d))
        {
            Invocation::Completed(Some(event)) => {
                tracing::debug!(event = %event, "event derived");
                metrics::counter!(m::EVENTS_DERIVED_TOTAL).increment(1);
                report.events.push(event);
            }
            Invocation::Completed(None) | Invocation::Faulted => {}
            Invocation::Unhandled => {
                if self.settings.log_unhandled {
                    note_record(report, "[event] Cannot handle message", record);
                }
            }
        }
    }
}

impl std::fmt::Debug for EventsProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventsProcessor")
            .field("settings", &self.settings)
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}
