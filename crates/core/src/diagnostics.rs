//! 진단 채널 -- 비치명적 이상 상황 보고
//!
//! 핸들러와 모듈 추출기는 전역 notifier를 호출하는 대신
//! [`Diagnostics`]를 명시적으로 전달받아 [`Note`]를 쌓습니다.
//! 쌓인 노트는 [`ProcessReport`](crate::types::ProcessReport)에 담겨
//! 호출자에게 반환되고, 데몬이 `tracing`으로 내보냅니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 진단 노트 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// 사람이 읽을 수 있는 메시지
    pub message: String,
    /// 관련 데이터 (원시 레코드, 에러 등)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Note {
    /// 컨텍스트 없는 노트를 생성합니다.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
        }
    }

    /// 컨텍스트가 첨부된 노트를 생성합니다.
    pub fn with_context(message: impl Into<String>, context: Value) -> Self {
        Self {
            message: message.into(),
            context: Some(context),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{} {}", self.message, ctx),
            None => write!(f, "{}", self.message),
        }
    }
}

/// 노트 수집기
///
/// 레코드 하나를 처리하는 동안 발생한 노트를 순서대로 모읍니다.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    notes: Vec<Note>,
}

impl Diagnostics {
    /// 빈 수집기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 메시지만 있는 노트를 추가합니다.
    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(Note::new(message));
    }

    /// 컨텍스트가 첨부된 노트를 추가합니다.
    pub fn note_with(&mut self, message: impl Into<String>, context: Value) {
        self.notes.push(Note::with_context(message, context));
    }

    /// 수집된 노트 목록
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// 수집된 노트 수
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// 노트가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// 다른 수집기의 노트를 이어 붙입니다.
    pub fn extend(&mut self, other: Diagnostics) {
        self.notes.extend(other.notes);
    }

    /// 노트 소유권을 넘깁니다.
    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }
}
