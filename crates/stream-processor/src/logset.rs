//! 로그셋 키 도출
//!
//! 로그 라인을 묶는 그룹 키("logset")를 다음 순서로 결정합니다.
//!
//! 1. `log.file.path`
//! 2. `input.type == "journald"`일 때
//!    `journald.container.<container.name>` →
//!    `journald.process.<journald.process.name>` →
//!    `journald.syslog.<syslog.identifier>` →
//!    `journald.generic`
//!
//! 파일 경로가 journald 필드보다 항상 우선합니다.

use tapflow_core::record::Record;

/// 로그 파일 경로 필드
pub const FILE_PATH: &str = "log.file.path";
/// 입력 유형 필드
pub const INPUT_TYPE: &str = "input.type";

const JOURNALD: &str = "journald";

/// 캐시 네임스페이스 접두어
pub const NAMESPACE_PREFIX: &str = "logs:";

/// 파일 경로 규칙
pub fn from_file(record: &Record) -> Option<String> {
    record.str_at(FILE_PATH).map(str::to_owned)
}

/// journald 규칙. journald 입력이 아니면 `None`입니다.
pub fn from_journald(record: &Record) -> Option<String> {
    if record.str_at(INPUT_TYPE) != Some(JOURNALD) {
        return None;
    }

    let logset = if let Some(name) = record.str_at("container.name") {
        format!("{JOURNALD}.container.{name}")
    } else if let Some(name) = record.str_at("journald.process.name") {
        format!("{JOURNALD}.process.{name}")
    } else if let Some(ident) = record.str_at("syslog.identifier") {
        format!("{JOURNALD}.syslog.{ident}")
    } else {
        format!("{JOURNALD}.generic")
    };
    Some(logset)
}

/// 규칙을 순서대로 적용해 로그셋을 도출합니다.
pub fn derive(record: &Record) -> Option<String> {
    from_file(record).or_else(|| from_journald(record))
}

/// 로그셋의 캐시 네임스페이스
pub fn namespace(logset: &str) -> String {
    format!("{NAMESPACE_PREFIX}{logset}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_path_wins_over_journald() {
        let record = Record::new(json!({
            "log": { "file": { "path": "/var/log/syslog" } },
            "input": { "type": "journald" },
            "container": { "name": "web" }
        }));
        assert_eq!(derive(&record).as_deref(), Some("/var/log/syslog"));
    }

    #[test]
    fn journald_precedence_chain() {
        let record = Record::new(json!({
            "input": { "type": "journald" },
            "container": { "name": "web" },
            "journald": { "process": { "name": "nginx" } },
            "syslog": { "identifier": "kernel" }
        }));
        assert_eq!(derive(&record).as_deref(), Some("journald.container.web"));

        let record = Record::new(json!({
            "input": { "type": "journald" },
            "journald": { "process": { "name": "nginx" } },
            "syslog": { "identifier": "kernel" }
        }));
        assert_eq!(derive(&record).as_deref(), Some("journald.process.nginx"));
    }

    #[test]
    fn journald_syslog_identifier_only() {
        let record = Record::new(json!({
            "input": { "type": "journald" },
            "syslog": { "identifier": "sshd" }
        }));
        assert_eq!(derive(&record).as_deref(), Some("journald.syslog.sshd"));
    }

    #[test]
    fn journald_without_identifiers_is_generic() {
        let record = Record::new(json!({
            "input": { "type": "journald" },
            "container": { "name": "" }
        }));
        assert_eq!(derive(&record).as_deref(), Some("journald.generic"));
    }

    #[test]
    fn no_rule_applies() {
        let record = Record::new(json!({ "input": { "type": "filestream" } }));
        assert_eq!(derive(&record), None);
        assert_eq!(derive(&Record::new(json!({}))), None);
    }

    #[test]
    fn namespace_is_prefixed() {
        assert_eq!(namespace("journald.generic"), "logs:journald.generic");
    }
}
