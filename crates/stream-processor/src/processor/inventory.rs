//! 인벤토리 토픽 핸들러
//!
//! 세 토픽을 하나의 프로세서에서 처리합니다.
//!
//! - `metrics`: 인벤토리 플래그 레코드에서 호스트 조각을 만들어 전파
//! - `audit`: 기존 패키지를 호스트별로 패키지명 기준 누적하고, 새로 보거나 버전이 바뀐
//!   패키지만 전파
//! - `inventory`: 플래그 레코드를 호스트 싱크로 전달

use std::collections::{BTreeMap, BTreeSet};

use dashmap::DashMap;
use tapflow_core::metrics as m;
use tapflow_core::pipeline::{ProcessorInfo, TopicProcessor};
use tapflow_core::record::Record;
use tapflow_core::types::{
    InventoryHostFragment, InventoryUpdate, PackageRef, ProcessReport, TOPIC_AUDIT, TOPIC_INVENTORY,
    TOPIC_METRICS,
};

use super::{note_record, processor_info};
use crate::config::InventorySettings;
use crate::error::StreamProcessorError;
use crate::modules::{InventoryExtractor, inventory_audit_registry, inventory_metrics_registry};
use crate::registry::ModuleRegistry;
use crate::toolset::Toolset;

/// 프로세서 이름
pub const NAME: &str = "inventory";

/// 인벤토리 스트림 프로세서
pub struct InventoryProcessor {
    info: ProcessorInfo,
    settings: InventorySettings,
    metrics: ModuleRegistry<dyn InventoryExtractor>,
    audit: ModuleRegistry<dyn InventoryExtractor>,
    /// 호스트 ID → (패키지명 → 버전)
    packages: DashMap<String, BTreeMap<String, Option<String>>>,
    tools: Toolset,
}

impl InventoryProcessor {
    pub fn new(
        settings: InventorySettings,
        metrics: ModuleRegistry<dyn InventoryExtractor>,
        audit: ModuleRegistry<dyn InventoryExtractor>,
        tools: Toolset,
    ) -> Self {
        let info = processor_info(
            NAME,
            "Inventory stream processor",
            "Builds an inventory of hosts from metrics, audit and inventory data.",
            &[TOPIC_AUDIT, TOPIC_INVENTORY, TOPIC_METRICS],
        );
        Self {
            info,
            settings,
            metrics,
            audit,
            packages: DashMap::new(),
            tools,
        }
    }

    /// 기본 인벤토리 레지스트리로 생성합니다.
    pub fn with_defaults(settings: InventorySettings, tools: Toolset) -> Result<Self, StreamProcessorError> {
        let metrics = inventory_metrics_registry()?;
        let audit = inventory_audit_registry(&settings.ignored_audit_actions)?;
        Ok(Self::new(settings, metrics, audit, tools))
    }

    /// 호스트별 누적 패키지. 패키지명마다 마지막으로 관측된 버전 하나만 유지됩니다.
    pub fn packages_for(&self, host_id: &str) -> BTreeSet<PackageRef> {
        self.packages
            .get(host_id)
            .map(|known| {
                known
                    .iter()
                    .map(|(name, version)| PackageRef {
                        name: name.clone(),
                        version: version.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 관측된 패키지를 누적하고, 새 패키지나 버전이 바뀐 패키지만 반환합니다.
    fn record_packages(&self, host_id: &str, observed: &BTreeSet<PackageRef>) -> BTreeSet<PackageRef> {
        let mut known = self.packages.entry(host_id.to_owned()).or_default();
        observed
            .iter()
            .filter(|pkg| {
                let previous = known.insert(pkg.name.clone(), pkg.version.clone());
                previous.as_ref() != Some(&pkg.version)
            })
            .cloned()
            .collect()
    }

    fn produce(&self, fragment: InventoryHostFragment, record: &Record, report: &mut ProcessReport) {
        let module = record.module().unwrap_or_default();
        tracing::debug!(host = %fragment.id, module, fields = fragment.populated_fields(), "producing inventory update");
        self.tools
            .inventory
            .produce_inventory_update(InventoryUpdate::new(fragment, module));
        report.inventory_updates += 1;
        metrics::counter!(m::INVENTORY_UPDATES_TOTAL).increment(1);
    }

    fn process_metrics(&self, record: &Record, report: &mut ProcessReport) {
        if !record.is_inventory_update() {
            return;
        }
        if record.host_id().is_none() {
            note_record(report, "[inventory] Host lacks ID", record);
        }

        let outcome = self
            .metrics
            .invoke(record, &mut report.diagnostics, |module, r, d| module.extract(r, d));
        if let Some(Some(fragment)) = outcome.completed() {
            if fragment.should_propagate() {
                self.produce(fragment, record, report);
            }
        }
    }

    fn process_audit(&self, record: &Record, report: &mut ProcessReport) {
        let outcome = self
            .audit
            .invoke(record, &mut report.diagnostics, |module, r, d| module.extract(r, d));
        let Some(Some(mut fragment)) = outcome.completed() else {
            return;
        };

        if fragment.is_package_fragment() {
            let changed = self.record_packages(&fragment.id, &fragment.packages);
            if changed.is_empty() {
                tracing::trace!(host = %fragment.id, "packages already known");
                return;
            }
            fragment.packages = changed;
        }
        if fragment.should_propagate() {
            self.produce(fragment, record, report);
        }
    }

    fn process_inventory(&self, record: &Record, report: &mut ProcessReport) {
        if record.is_inventory_update() {
            self.tools.hosts.update_host(record);
            report.host_updates += 1;
        }
    }
}

impl TopicProcessor for InventoryProcessor {
    fn info(&self) -> &ProcessorInfo {
        &self.info
    }

    fn topics(&self) -> &[String] {
        &self.settings.topics
    }

    fn process(&self, topic: &str, record: &Record, report: &mut ProcessReport) {
        match topic {
            TOPIC_METRICS => self.process_metrics(record, report),
            TOPIC_AUDIT => self.process_audit(record, report),
            TOPIC_INVENTORY => self.process_inventory(record, report),
            other => {
                tracing::debug!(topic = other, "inventory processor has no handler for topic");
                report
                    .diagnostics
                    .note(format!("[inventory] No handler for topic: {other}"));
            }
        }
    }
}

impl std::fmt::Debug for InventoryProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryProcessor")
            .field("settings", &self.settings)
            .field("metrics", &self.metrics)
            .field("audit", &self.audit)
            .field("hosts_with_packages", &self.packages.len())
            .finish_non_exhaustive()
    }
}
