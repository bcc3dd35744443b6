//! `linux-system` 감사 추출기
//!
//! auditd 레코드를 `event.action`으로 분류해 사람이 읽을 수 있는 제목의
//! [`Event`]로 변환합니다. 첫 번째로 일치하는 규칙이 적용되며,
//! 알려지지 않은 액션은 이벤트를 만들지 않습니다.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tapflow_core::diagnostics::Diagnostics;
use tapflow_core::error::ExtractError;
use tapflow_core::record::Record;
use tapflow_core::types::{Event, EventSummary, short_id};

use super::AuditExtractor;
use crate::config::AuditSettings;

/// 요약에서 제거하는 사용자 하위 필드
const NOISY_USER_FIELDS: [&str; 4] = ["audit", "selinux", "saved", "filesystem"];

const UNKNOWN: &str = "unknown";

/// `linux-system` 감사 추출기
#[derive(Debug, Clone, Default)]
pub struct LinuxSystemAudit {
    settings: AuditSettings,
}

impl LinuxSystemAudit {
    /// 추적 설정과 함께 추출기를 생성합니다.
    pub fn new(settings: AuditSettings) -> Self {
        Self { settings }
    }
}

impl AuditExtractor for LinuxSystemAudit {
    fn extract(&self, record: &Record, diag: &mut Diagnostics) -> Result<Option<Event>, ExtractError> {
        let Some(action) = record.action() else {
            return Ok(None);
        };

        let summary = summarize(record);
        let event = classify(action, record, summary);

        if self.settings.should_trace(action) {
            diag.note_with(
                format!("Audit event: {action}"),
                json!({ "event": event, "record": record.value() }),
            );
        }

        Ok(event)
    }
}

/// 감사 레코드의 공통 요약을 만듭니다.
pub fn summarize(record: &Record) -> EventSummary {
    let time = record
        .str_at("@timestamp")
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map_or_else(Utc::now, |ts| ts.with_timezone(&Utc));

    let id = record
        .text_at("event.id")
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let user = record.get("user").filter(|v| !v.is_null()).cloned().map(|mut user| {
        if let Value::Object(fields) = &mut user {
            for field in NOISY_USER_FIELDS {
                fields.remove(field);
            }
        }
        user
    });

    EventSummary {
        time,
        host: record.host_id().map(str::to_owned),
        module: record.module().map(str::to_owned),
        sid: format!("audit.{id}"),
        user,
        process: record.get("process").filter(|v| !v.is_null()).cloned(),
        result: record.get("auditd.result").cloned(),
        data: record.get("auditd.data").filter(|v| !v.is_null()).cloned(),
    }
}

fn classify(action: &str, record: &Record, summary: EventSummary) -> Option<Event> {
    let host = summary
        .host
        .as_deref()
        .map(short_id)
        .filter(|h| !h.is_empty())
        .unwrap_or(UNKNOWN)
        .to_owned();
    let user = record.text_at("user.name").unwrap_or_else(|| UNKNOWN.to_owned());
    let data = summary.data.clone().unwrap_or(Value::Null);

    let title = match action {
        "changed-audit-configuration" => {
            let op = data.get("op").and_then(Value::as_str);
            let enabled = data.get("audit_enabled");
            let base = match op {
                Some("add_rule") => "Auditd rule added".to_owned(),
                Some("remove_rule") => "Auditd rule removed".to_owned(),
                Some("set") if enabled.and_then(Value::as_str) == Some("1") => {
                    if data.get("old") == enabled {
                        "Auditd audit enabled (no change)".to_owned()
                    } else {
                        "Auditd audit enabled (was disabled)".to_owned()
                    }
                }
                _ => "Auditd configuration change".to_owned(),
            };
            format!("{base} on {host}")
        }
        "added-group-account-to" => {
            let group = record.text_at("group.name").unwrap_or_else(|| UNKNOWN.to_owned());
            format!("New group {group} added by {user} on {host}")
        }
        "delete-group-account-from" | "deleted-group-account-from" => {
            let group = record.text_at("group.id").unwrap_or_else(|| UNKNOWN.to_owned());
            format!("Group {group} removed by {user} on {host}")
        }
        "ran-command" => format!("Privileged command execution by {user} on {host}"),
        "started-session" | "ended-session" => {
            let kind = action.split('-').next().unwrap_or(action);
            let mut title = format!("Session {kind} by {user}");
            if let Some(effective) = record.text_at("user.effective.name") {
                title.push_str(&format!(" (as {effective})"));
            }
            if let Some(terminal) = data.get("terminal").and_then(Value::as_str) {
                title.push(' ');
                title.push_str(terminal);
            }
            title.push_str(&format!(" on {host}"));
            title
        }
        _ => return None,
    };

    let mut event = Event::untitled(summary, action);
    event.title = title;
    Some(event)
}
