//! `linux-system` 인벤토리 추출기
//!
//! - [`LinuxSystemMetrics`]: 메트릭 레코드의 `host.*`, `system.*` 필드로 호스트 조각 생성
//! - [`LinuxSystemAuditInventory`]: 감사 레코드에서 기존 패키지 정보 추출
//!
//! 조각은 비어있지 않은 `host.id` 없이 만들어지지 않습니다.

use std::collections::BTreeSet;

use serde_json::{Value, json};
use tapflow_core::diagnostics::Diagnostics;
use tapflow_core::error::ExtractError;
use tapflow_core::record::Record;
use tapflow_core::types::{InventoryHostFragment, PackageRef};

use super::InventoryExtractor;
use crate::normalize::{normalize_ip_value, normalize_mac_value};

/// 패키지 보고 액션
pub const EXISTING_PACKAGE: &str = "existing_package";

/// 앞뒤 공백과 제어 문자를 제거합니다. 결과가 비면 `None`입니다.
pub fn clean(input: &str) -> Option<String> {
    let cleaned: String = input.trim().chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_owned())
}

fn clean_at(record: &Record, path: &str) -> Option<String> {
    record.str_at(path).and_then(clean)
}

/// 단일 값 또는 배열을 정규화 함수로 매핑합니다. 실패한 항목은 버려집니다.
fn addresses(
    value: Option<&Value>,
    diag: &mut Diagnostics,
    normalize: fn(&Value, &mut Diagnostics) -> Option<String>,
) -> BTreeSet<String> {
    match value {
        None | Some(Value::Null) => BTreeSet::new(),
        Some(Value::Array(items)) => items.iter().filter_map(|v| normalize(v, diag)).collect(),
        Some(single) => normalize(single, diag).into_iter().collect(),
    }
}

/// 레코드에서 호스트 조각을 만듭니다.
///
/// `host.id`가 없으면 노트를 남기고 `None`을 반환합니다.
pub fn host_fragment(record: &Record, diag: &mut Diagnostics) -> Option<InventoryHostFragment> {
    let Some(id) = record.host_id().and_then(clean) else {
        diag.note_with(
            "Inventory fragment requires host.id",
            json!({ "record": record.value() }),
        );
        return None;
    };

    Some(InventoryHostFragment {
        id,
        name: clean_at(record, "host.hostname"),
        fqdn: clean_at(record, "host.name"),
        arch: clean_at(record, "host.architecture"),
        memory: record.u64_at("system.memory.total"),
        ip: addresses(record.get("host.ip"), diag, normalize_ip_value),
        mac: addresses(record.get("host.mac"), diag, normalize_mac_value),
        os: record.get("host.os").filter(|v| !v.is_null()).cloned(),
        cores: record.u64_at("system.load.cores"),
        packages: BTreeSet::new(),
    })
}

/// 메트릭 기반 인벤토리 추출기
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSystemMetrics;

impl InventoryExtractor for LinuxSystemMetrics {
    fn extract(
        &self,
        record: &Record,
        diag: &mut Diagnostics,
    ) -> Result<Option<InventoryHostFragment>, ExtractError> {
        Ok(host_fragment(record, diag))
    }
}

/// 감사 기반 인벤토리 추출기
#[derive(Debug, Clone, Default)]
pub struct LinuxSystemAuditInventory {
    ignored_actions: BTreeSet<String>,
}

impl LinuxSystemAuditInventory {
    /// 노트 없이 무시할 액션 목록으로 생성합니다.
    pub fn new(ignored_actions: BTreeSet<String>) -> Self {
        Self { ignored_actions }
    }

    /// 충분한 메트릭 조각, 아니면 ID만 있는 조각
    fn base(record: &Record, diag: &mut Diagnostics) -> Option<InventoryHostFragment> {
        let fragment = host_fragment(record, diag)?;
        if fragment.is_sufficient() {
            return Some(fragment);
        }
        Some(InventoryHostFragment {
            id: fragment.id,
            ..InventoryHostFragment::default()
        })
    }
}

fn package(record: &Record) -> Result<Option<PackageRef>, ExtractError> {
    let Some(pkg) = record.get("package") else {
        return Ok(None);
    };
    if !pkg.is_object() {
        return Err(ExtractError::InvalidField {
            field: "package".to_owned(),
            reason: "expected an object".to_owned(),
        });
    }
    let Some(name) = pkg.get("name").and_then(Value::as_str).and_then(clean) else {
        return Err(ExtractError::MissingField("package.name".to_owned()));
    };
    let version = match pkg.get("version") {
        Some(Value::String(v)) => clean(v),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Ok(Some(PackageRef { name, version }))
}

impl InventoryExtractor for LinuxSystemAuditInventory {
    fn extract(
        &self,
        record: &Record,
        diag: &mut Diagnostics,
    ) -> Result<Option<InventoryHostFragment>, ExtractError> {
        let Some(action) = record.action() else {
            return Ok(None);
        };

        if action == EXISTING_PACKAGE {
            let Some(pkg) = package(record)? else {
                return Ok(None);
            };
            let Some(mut fragment) = Self::base(record, diag) else {
                return Ok(None);
            };
            fragment.packages.insert(pkg);
            return Ok(Some(fragment));
        }

        if !self.ignored_actions.contains(action) {
            diag.note_with(format!("Audit/Inventory: {action}"), json!({ "record": record.value() }));
        }
        Ok(None)
    }
}
