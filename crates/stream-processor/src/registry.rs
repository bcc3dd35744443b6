//! 모듈 레지스트리 -- `origin.module` 태그별 추출기 조회와 결함 격리
//!
//! [`ModuleRegistry`]는 한 추출기 계열(audit, logs, inventory.metrics,
//! inventory.audit)의 태그 → 추출기 매핑을 보관합니다.
//! 새 데이터 소스는 태그와 추출기를 등록하는 것만으로 추가됩니다.
//!
//! [`ModuleRegistry::invoke`]는 추출기 호출 지점에서 반환 에러와 패닉을 모두 잡아
//! 노트 한 건으로 바꿉니다. 모듈 결함은 파이프라인 밖으로 전파되지 않습니다.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::json;
use tapflow_core::diagnostics::Diagnostics;
use tapflow_core::error::{ExtractError, RegistryError};
use tapflow_core::metrics as m;
use tapflow_core::record::Record;

/// 추출기 호출 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation<T> {
    /// 태그가 없거나 등록된 추출기가 없음
    Unhandled,
    /// 추출기가 정상 반환함
    Completed(T),
    /// 추출기가 에러를 반환하거나 패닉함 (노트 기록됨)
    Faulted,
}

impl<T> Invocation<T> {
    /// 정상 반환 값을 꺼냅니다.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Unhandled | Self::Faulted => None,
        }
    }

    /// 결함 여부
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted)
    }
}

/// 태그 → 추출기 레지스트리
///
/// `E`는 추출기 trait 객체 타입입니다 (예: `dyn AuditExtractor`).
pub struct ModuleRegistry<E: ?Sized> {
    /// 추출기 계열 이름 (노트와 메트릭 레이블에 사용)
    family: String,
    modules: HashMap<String, Arc<E>>,
}

impl<E: ?Sized> ModuleRegistry<E> {
    /// 빈 레지스트리를 생성합니다.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            modules: HashMap::new(),
        }
    }

    /// 추출기를 등록합니다.
    ///
    /// 빈 태그와 중복 태그는 거부됩니다.
    pub fn register(&mut self, tag: impl Into<String>, module: Arc<E>) -> Result<(), RegistryError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(RegistryError::EmptyTag {
                family: self.family.clone(),
            });
        }
        if self.modules.contains_key(&tag) {
            return Err(RegistryError::DuplicateModule {
                family: self.family.clone(),
                tag,
            });
        }
        tracing::debug!(family = %self.family, module = %tag, "module registered");
        self.modules.insert(tag, module);
        Ok(())
    }

    /// 추출기를 등록하고 레지스트리를 반환합니다 (빌더 스타일).
    pub fn with(mut self, tag: impl Into<String>, module: Arc<E>) -> Result<Self, RegistryError> {
        self.register(tag, module)?;
        Ok(self)
    }

    /// 계열 이름
    pub fn family(&self) -> &str {
        &self.family
    }

    /// 태그로 추출기를 조회합니다.
    pub fn get(&self, tag: &str) -> Option<&Arc<E>> {
        self.modules.get(tag)
    }

    /// 등록된 태그 목록 (정렬됨)
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// 등록된 추출기 수
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// 레지스트리가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// 레코드의 `origin.module` 태그로 추출기를 찾아 호출합니다.
    ///
    /// 추출기가 남긴 노트는 정상 반환 시에만 `diag`에 합쳐집니다.
    /// 결함 시에는 추출기의 노트를 버리고 에러와 레코드를 담은 노트 한 건만 남깁니다.
    pub fn invoke<T, F>(&self, record: &Record, diag: &mut Diagnostics, call: F) -> Invocation<T>
    where
        F: FnOnce(&E, &Record, &mut Diagnostics) -> Result<T, ExtractError>,
    {
        let Some(tag) = record.module() else {
            return Invocation::Unhandled;
        };
        let Some(module) = self.modules.get(tag) else {
            return Invocation::Unhandled;
        };

        let mut scratch = Diagnostics::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| call(&**module, record, &mut scratch)));

        let error = match outcome {
            Ok(Ok(value)) => {
                diag.extend(scratch);
                return Invocation::Completed(value);
            }
            Ok(Err(err)) => err.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        tracing::warn!(
            family = %self.family,
            module = %tag,
            error = %error,
            "module extractor fault"
        );
        metrics::counter!(m::MODULE_FAULTS_TOTAL, m::LABEL_MODULE => tag.to_owned()).increment(1);

        diag.note_with(
            format!("[{}] Error in module logic: {error}", self.family),
            json!({
                "module": tag,
                "error": error,
                "record": record.value(),
            }),
        );
        Invocation::Faulted
    }
}

impl<E: ?Sized> std::fmt::Debug for ModuleRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("family", &self.family)
            .field("modules", &self.tags())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {msg}")
    } else {
        "panic: <non-string payload>".to_owned()
    }
}
