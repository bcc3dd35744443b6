//! 토픽 디스패처
//!
//! 레코드와 토픽을 받아 해당 토픽을 구독한 프로세서 하나를 호출합니다.
//! 구독 충돌과 빈 구독은 빌드 시점에 거부되며, 디스패치 경로에는 실패가 없습니다.
//!
//! # 사용 예시
//! ```ignore
//! let (tools, _cache, _sink) = Toolset::in_memory();
//! let dispatcher = Dispatcher::from_config(&StreamConfig::default(), tools)?;
//!
//! if let Some(report) = dispatcher.dispatch("logs", &record) {
//!     for note in report.notes() { /* ... */ }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tapflow_core::error::RegistryError;
use tapflow_core::metrics as m;
use tapflow_core::pipeline::{ProcessorInfo, TopicProcessor};
use tapflow_core::record::Record;
use tapflow_core::types::ProcessReport;

use crate::config::StreamConfig;
use crate::error::StreamProcessorError;
use crate::processor::{EventsProcessor, InventoryProcessor, LogsProcessor};
use crate::toolset::Toolset;

/// 토픽 → 프로세서 디스패처
pub struct Dispatcher {
    routes: HashMap<String, Arc<dyn TopicProcessor>>,
    processors: Vec<Arc<dyn TopicProcessor>>,
}

impl Dispatcher {
    /// 빌더를 생성합니다.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// 설정에서 활성화된 프로세서를 기본 레지스트리로 등록합니다.
    pub fn from_config(config: &StreamConfig, tools: Toolset) -> Result<Self, StreamProcessorError> {
        config.validate()?;

        let mut builder = Self::builder();
        if config.events.enabled {
            builder = builder.register(Arc::new(EventsProcessor::with_defaults(
                config.events.clone(),
                &config.audit,
                tools.clone(),
            )?));
        }
        if config.logs.enabled {
            builder = builder.register(Arc::new(LogsProcessor::with_defaults(
                config.logs.clone(),
                tools.clone(),
            )?));
        }
        if config.inventory.enabled {
            builder = builder.register(Arc::new(InventoryProcessor::with_defaults(
                config.inventory.clone(),
                tools,
            )?));
        }
        builder.build()
    }

    /// 레코드를 구독 프로세서로 보냅니다.
    ///
    /// 구독 프로세서가 없으면 아무것도 하지 않고 `None`을 반환합니다.
    pub fn dispatch(&self, topic: &str, record: &Record) -> Option<ProcessReport> {
        let Some(processor) = self.routes.get(topic) else {
            tracing::trace!(topic, "no processor subscribed to topic");
            metrics::counter!(m::RECORDS_UNROUTED_TOTAL, m::LABEL_TOPIC => topic.to_owned()).increment(1);
            return None;
        };

        let name = processor.info().name.clone();
        let started = Instant::now();
        let mut report = ProcessReport::new(name.clone());
        processor.process(topic, record, &mut report);

        metrics::counter!(m::RECORDS_DISPATCHED_TOTAL, m::LABEL_TOPIC => topic.to_owned()).increment(1);
        metrics::histogram!(m::PROCESSING_DURATION_SECONDS, m::LABEL_PROCESSOR => name.clone())
            .record(started.elapsed().as_secs_f64());
        if !report.diagnostics.is_empty() {
            metrics::counter!(m::NOTES_TOTAL, m::LABEL_PROCESSOR => name)
                .increment(report.diagnostics.len() as u64);
        }

        Some(report)
    }

    /// 구독 토픽 목록 (정렬됨)
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        topics.sort_unstable();
        topics
    }

    /// 토픽을 구독한 프로세서 이름
    pub fn processor_for(&self, topic: &str) -> Option<&str> {
        self.routes.get(topic).map(|p| p.info().name.as_str())
    }

    /// 등록된 프로세서 메타데이터 (등록 순서)
    pub fn processors(&self) -> Vec<&ProcessorInfo> {
        self.processors.iter().map(|p| p.info()).collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("topics", &self.topics())
            .finish()
    }
}

/// 디스패처 빌더
///
/// 프로세서를 등록 순서대로 모은 뒤 [`build`](Self::build)에서 구독 테이블을 검증합니다.
#[derive(Default)]
pub struct DispatcherBuilder {
    processors: Vec<Arc<dyn TopicProcessor>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로세서를 등록합니다.
    pub fn register(mut self, processor: Arc<dyn TopicProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// 구독 테이블을 만들고 검증합니다.
    ///
    /// # Errors
    /// - 구독 토픽이 없는 프로세서: [`RegistryError::NoTopics`]
    /// - 같은 토픽을 두 프로세서가 구독: [`RegistryError::DuplicateTopic`]
    pub fn build(self) -> Result<Dispatcher, StreamProcessorError> {
        let mut routes: HashMap<String, Arc<dyn TopicProcessor>> = HashMap::new();

        for processor in &self.processors {
            let info = processor.info();
            let topics = processor.topics();
            if topics.is_empty() {
                return Err(RegistryError::NoTopics {
                    name: info.name.clone(),
                }
                .into());
            }

            for topic in topics {
                if let Some(first) = routes.get(topic) {
                    return Err(RegistryError::DuplicateTopic {
                        topic: topic.clone(),
                        first: first.info().name.clone(),
                        second: info.name.clone(),
                    }
                    .into());
                }
                if !info.default_topics.contains(topic) {
                    tracing::warn!(
                        processor = %info.name,
                        topic = %topic,
                        defaults = ?info.default_topics,
                        "processor subscribed to a non-default topic"
                    );
                }
                routes.insert(topic.clone(), Arc::clone(processor));
            }
            tracing::info!(processor = %info.name, topics = ?topics, "processor registered");
        }

        Ok(Dispatcher {
            routes,
            processors: self.processors,
        })
    }
}
