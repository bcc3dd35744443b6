//! 원시 레코드 -- 버스에서 수신한 중첩 JSON 메시지
//!
//! [`Record`]는 토픽으로 들어온 메시지를 소유하는 불투명 래퍼입니다.
//! 필드 접근은 dot notation 경로(`log.file.path`)로 수행하며,
//! 파이프라인 호출이 끝나면 캐시에 복사된 경우를 제외하고 버려집니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 모듈 태그 경로
pub const MODULE_PATH: &str = "origin.module";
/// 인벤토리 업데이트 플래그 경로
pub const INVENTORY_UPDATE_PATH: &str = "origin.inventory_update";
/// 인벤토리 업데이트 플래그의 camelCase 별칭
pub const INVENTORY_UPDATE_ALIAS_PATH: &str = "origin.inventoryUpdate";
/// 호스트 ID 경로
pub const HOST_ID_PATH: &str = "host.id";
/// 로그 메시지 본문 경로
pub const MESSAGE_PATH: &str = "message";
/// 감사 액션 경로
pub const ACTION_PATH: &str = "event.action";

/// 버스에서 수신한 원시 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// JSON 값을 레코드로 감쌉니다.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// JSON 문자열에서 레코드를 파싱합니다.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Self)
    }

    /// 내부 JSON 값을 반환합니다.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// 내부 JSON 값의 소유권을 넘깁니다.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// dot notation 경로로 필드를 조회합니다.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |current, part| current.get(part))
    }

    /// 비어있지 않은 문자열 필드를 조회합니다.
    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// 문자열/숫자/불리언 필드를 문자열로 조회합니다.
    pub fn text_at(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// 부호 없는 정수 필드를 조회합니다. 숫자 문자열도 허용합니다.
    pub fn u64_at(&self, path: &str) -> Option<u64> {
        match self.get(path)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 불리언 필드가 참인지 확인합니다.
    pub fn is_true(&self, path: &str) -> bool {
        matches!(self.get(path), Some(Value::Bool(true)))
    }

    /// 필드가 존재하는지 확인합니다 (`null` 포함).
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// `origin.module` 태그
    pub fn module(&self) -> Option<&str> {
        self.str_at(MODULE_PATH)
    }

    /// `host.id`
    pub fn host_id(&self) -> Option<&str> {
        self.str_at(HOST_ID_PATH)
    }

    /// 인벤토리 업데이트 플래그가 설정되어 있는지 확인합니다.
    pub fn is_inventory_update(&self) -> bool {
        self.is_true(INVENTORY_UPDATE_PATH) || self.is_true(INVENTORY_UPDATE_ALIAS_PATH)
    }

    /// 로그 메시지 본문
    pub fn message(&self) -> Option<&str> {
        self.str_at(MESSAGE_PATH)
    }

    /// 감사 액션 태그 (`event.action`)
    pub fn action(&self) -> Option<&str> {
        self.str_at(ACTION_PATH)
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        Record::new(json!({
            "message": "session opened",
            "host": { "id": "4f1c2a90-77aa-4b1e-9c43-1d2e3f4a5b6c", "ip": ["10.0.0.1"] },
            "log": { "file": { "path": "/var/log/auth.log" } },
            "system": { "memory": { "total": 8_589_934_592u64 }, "load": { "cores": "4" } },
            "origin": { "module": "linux-system", "inventory_update": true },
            "empty": ""
        }))
    }

    #[test]
    fn get_walks_dotted_path() {
        let record = sample();
        assert_eq!(
            record.str_at("log.file.path"),
            Some("/var/log/auth.log")
        );
        assert!(record.get("log.file.missing").is_none());
        assert!(record.get("message.deeper").is_none());
    }

    #[test]
    fn empty_strings_are_absent() {
        let record = sample();
        assert!(record.has("empty"));
        assert_eq!(record.str_at("empty"), None);
        assert_eq!(record.text_at("empty"), None);
    }

    #[test]
    fn u64_accepts_numbers_and_numeric_strings() {
        let record = sample();
        assert_eq!(record.u64_at("system.memory.total"), Some(8_589_934_592));
        assert_eq!(record.u64_at("system.load.cores"), Some(4));
        assert_eq!(record.u64_at("message"), None);
    }

    #[test]
    fn origin_accessors() {
        let record = sample();
        assert_eq!(record.module(), Some("linux-system"));
        assert!(record.is_inventory_update());
        assert_eq!(
            record.host_id(),
            Some("4f1c2a90-77aa-4b1e-9c43-1d2e3f4a5b6c")
        );
    }

    #[test]
    fn inventory_flag_accepts_camel_case_alias() {
        let record = Record::new(json!({ "origin": { "inventoryUpdate": true } }));
        assert!(record.is_inventory_update());

        let record = Record::new(json!({ "origin": { "inventory_update": "yes" } }));
        assert!(!record.is_inventory_update());
    }

    #[test]
    fn from_json_roundtrips_transparently() {
        let record = Record::from_json(r#"{"message":"x"}"#).unwrap();
        assert_eq!(record.message(), Some("x"));
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"message":"x"}"#);
    }
}
