//! 모듈 추출기 -- 데이터 소스별 변환 로직
//!
//! 각 추출기는 `origin.module` 태그로 선택되며, 계열마다 하나의 trait을 구현합니다.
//!
//! | 계열 | trait | 반환 |
//! |------|-------|------|
//! | `audit` | [`AuditExtractor`] | 파생 [`Event`] |
//! | `logs` | [`LogExtractor`] | [`LogExtraction`] (logset, line) |
//! | `inventory.metrics` | [`InventoryExtractor`] | 호스트 조각 |
//! | `inventory.audit` | [`InventoryExtractor`] | 호스트 조각 (패키지 포함) |
//!
//! 추출기는 에러를 반환하거나 패닉할 수 있으며, 레지스트리 호출 지점에서 격리됩니다.

pub mod audit;
pub mod inventory;
pub mod logs;

use std::collections::BTreeSet;
use std::sync::Arc;

use tapflow_core::diagnostics::Diagnostics;
use tapflow_core::error::{ExtractError, RegistryError};
use tapflow_core::record::Record;
use tapflow_core::types::{Event, InventoryHostFragment};

use crate::config::AuditSettings;
use crate::registry::ModuleRegistry;

pub use audit::LinuxSystemAudit;
pub use inventory::{LinuxSystemAuditInventory, LinuxSystemMetrics};
pub use logs::LinuxSystemLogs;

/// 기본 제공 모듈 태그
pub const LINUX_SYSTEM: &str = "linux-system";

/// 감사 추출기 계열 이름
pub const FAMILY_AUDIT: &str = "audit";
/// 로그 추출기 계열 이름
pub const FAMILY_LOGS: &str = "logs";
/// 메트릭 기반 인벤토리 추출기 계열 이름
pub const FAMILY_INVENTORY_METRICS: &str = "inventory.metrics";
/// 감사 기반 인벤토리 추출기 계열 이름
pub const FAMILY_INVENTORY_AUDIT: &str = "inventory.audit";

/// 감사 레코드 → 이벤트 추출기
pub trait AuditExtractor: Send + Sync {
    /// 이벤트를 만들 수 없는 레코드는 `Ok(None)`을 반환합니다.
    fn extract(&self, record: &Record, diag: &mut Diagnostics) -> Result<Option<Event>, ExtractError>;
}

/// 로그 추출 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogExtraction {
    /// 그룹 키
    pub logset: Option<String>,
    /// 로그 본문
    pub line: Option<String>,
}

impl LogExtraction {
    /// logset과 line이 모두 있는 결과를 생성합니다.
    pub fn pair(logset: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            logset: Some(logset.into()),
            line: Some(line.into()),
        }
    }

    /// 추출 실패 (기본 추출로 위임)
    pub fn none() -> Self {
        Self::default()
    }

    /// 둘 다 비어있지 않을 때만 쌍을 반환합니다.
    pub fn usable(&self) -> Option<(&str, &str)> {
        match (self.logset.as_deref(), self.line.as_deref()) {
            (Some(logset), Some(line)) if !logset.is_empty() && !line.is_empty() => {
                Some((logset, line))
            }
            _ => None,
        }
    }
}

/// 로그 레코드 → (logset, line) 추출기
pub trait LogExtractor: Send + Sync {
    /// logset과 line을 결정합니다.
    fn extract(&self, record: &Record, diag: &mut Diagnostics) -> Result<LogExtraction, ExtractError>;
}

/// 레코드 → 호스트 인벤토리 조각 추출기
pub trait InventoryExtractor: Send + Sync {
    /// 조각을 만들 수 없는 레코드는 `Ok(None)`을 반환합니다.
    fn extract(
        &self,
        record: &Record,
        diag: &mut Diagnostics,
    ) -> Result<Option<InventoryHostFragment>, ExtractError>;
}

/// 기본 감사 레지스트리 (`linux-system`)
pub fn audit_registry(settings: &AuditSettings) -> Result<ModuleRegistry<dyn AuditExtractor>, RegistryError> {
    ModuleRegistry::<dyn AuditExtractor>::new(FAMILY_AUDIT)
        .with(LINUX_SYSTEM, Arc::new(LinuxSystemAudit::new(settings.clone())))
}

/// 기본 로그 레지스트리 (`linux-system`)
pub fn logs_registry() -> Result<ModuleRegistry<dyn LogExtractor>, RegistryError> {
    ModuleRegistry::<dyn LogExtractor>::new(FAMILY_LOGS).with(LINUX_SYSTEM, Arc::new(LinuxSystemLogs))
}

/// 기본 메트릭 기반 인벤토리 레지스트리 (`linux-system`)
pub fn inventory_metrics_registry() -> Result<ModuleRegistry<dyn InventoryExtractor>, RegistryError> {
    ModuleRegistry::<dyn InventoryExtractor>::new(FAMILY_INVENTORY_METRICS)
        .with(LINUX_SYSTEM, Arc::new(LinuxSystemMetrics))
}

/// 기본 감사 기반 인벤토리 레지스트리 (`linux-system`)
pub fn inventory_audit_registry(
    ignored_actions: &BTreeSet<String>,
) -> Result<ModuleRegistry<dyn InventoryExtractor>, RegistryError> {
    ModuleRegistry::<dyn InventoryExtractor>::new(FAMILY_INVENTORY_AUDIT).with(
        LINUX_SYSTEM,
        Arc::new(LinuxSystemAuditInventory::new(ignored_actions.clone())),
    )
}
