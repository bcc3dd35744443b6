//! `linux-system` 로그 추출기

use tapflow_core::diagnostics::Diagnostics;
use tapflow_core::error::ExtractError;
use tapflow_core::record::Record;

use super::{LogExtraction, LogExtractor};
use crate::logset;

/// `linux-system` 로그 추출기
///
/// 파일 경로가 있으면 `(log.file.path, message)`, journald 입력이면
/// `(journald 로그셋, message)`를 반환합니다. 그 외에는 빈 결과를 반환해
/// 기본 추출로 넘깁니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxSystemLogs;

impl LogExtractor for LinuxSystemLogs {
    fn extract(&self, record: &Record, _diag: &mut Diagnostics) -> Result<LogExtraction, ExtractError> {
        let Some(message) = record.message() else {
            return Ok(LogExtraction::none());
        };

        Ok(match logset::derive(record) {
            Some(logset) => LogExtraction::pair(logset, message),
            None => LogExtraction::none(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(value: serde_json::Value) -> LogExtraction {
        let mut diag = Diagnostics::new();
        let out = LinuxSystemLogs.extract(&Record::new(value), &mut diag).unwrap();
        assert!(diag.is_empty());
        out
    }

    #[test]
    fn file_path_pair() {
        let out = extract(json!({
            "message": "sshd started",
            "log": { "file": { "path": "/var/log/auth.log" } }
        }));
        assert_eq!(out.usable(), Some(("/var/log/auth.log", "sshd started")));
    }

    #[test]
    fn journald_pair() {
        let out = extract(json!({
            "message": "unit started",
            "input": { "type": "journald" },
            "journald": { "process": { "name": "systemd" } }
        }));
        assert_eq!(out.usable(), Some(("journald.process.systemd", "unit started")));
    }

    #[test]
    fn no_source_is_empty() {
        assert_eq!(extract(json!({ "message": "orphan" })), LogExtraction::none());
        assert_eq!(
            extract(json!({ "log": { "file": { "path": "/var/log/x" } } })),
            LogExtraction::none()
        );
    }
}
