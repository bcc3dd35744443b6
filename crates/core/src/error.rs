//! 에러 타입 -- 도메인별 에러 정의
//!
//! 코어 파이프라인에는 치명적 에러가 없습니다. 잘못된 입력과 모듈 결함은
//! 진단 노트로 보고되며, 여기 정의된 에러는 설정 로딩과 빌드 단계,
//! 그리고 모듈 추출기의 반환값에만 사용됩니다.

/// tapflow 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TapflowError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 모듈/프로세서 등록 에러
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 등록 시점에 검증되는 에러
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// 빈 모듈 태그
    #[error("module tag must not be empty ({family})")]
    EmptyTag { family: String },

    /// 같은 태그가 이미 등록됨
    #[error("module '{tag}' already registered for {family}")]
    DuplicateModule { family: String, tag: String },

    /// 같은 토픽을 두 프로세서가 구독
    #[error("topic '{topic}' is claimed by both '{first}' and '{second}'")]
    DuplicateTopic {
        topic: String,
        first: String,
        second: String,
    },

    /// 구독 토픽이 없는 프로세서
    #[error("processor '{name}' subscribes to no topics")]
    NoTopics { name: String },
}

/// 모듈 추출기가 반환하는 에러
///
/// 추출기 내부 결함은 레지스트리 호출 지점에서 잡혀 노트로 보고되며,
/// 파이프라인 밖으로 전파되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// 필수 필드 누락
    #[error("missing field '{0}'")]
    MissingField(String),

    /// 필드 값이 기대한 형식이 아님
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// 모듈 고유 실패
    #[error("module failure: {0}")]
    Module(String),
}
