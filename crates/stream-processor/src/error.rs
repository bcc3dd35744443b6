//! 스트림 프로세서 에러 타입
//!
//! [`StreamProcessorError`]는 디스패처와 레지스트리를 빌드할 때 발생하는 에러를 표현합니다.
//! 레코드 처리 경로에는 에러가 없으며, 이상 상황은 진단 노트로 보고됩니다.
//! `From<StreamProcessorError> for TapflowError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use tapflow_core::error::{ConfigError, RegistryError, TapflowError};

/// 스트림 프로세서 빌드 에러
#[derive(Debug, thiserror::Error)]
pub enum StreamProcessorError {
    /// 모듈 등록 또는 토픽 구독 충돌
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// 캐시 보존 정책이 유효하지 않음
    #[error("invalid retention for '{namespace}': {reason}")]
    InvalidRetention {
        /// 캐시 네임스페이스
        namespace: String,
        /// 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<StreamProcessorError> for TapflowError {
    fn from(err: StreamProcessorError) -> Self {
        match err {
            StreamProcessorError::Registry(e) => TapflowError::Registry(e),
            StreamProcessorError::InvalidRetention { namespace, reason } => {
                TapflowError::Config(ConfigError::InvalidValue {
                    field: namespace,
                    reason,
                })
            }
            StreamProcessorError::Config { field, reason } => {
                TapflowError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_is_transparent() {
        let err: StreamProcessorError = RegistryError::DuplicateModule {
            family: "audit".to_owned(),
            tag: "linux-system".to_owned(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "module 'linux-system' already registered for audit"
        );
    }

    #[test]
    fn converts_to_tapflow_error() {
        let err = StreamProcessorError::InvalidRetention {
            namespace: "logs".to_owned(),
            reason: "cap must be greater than 0".to_owned(),
        };
        let top: TapflowError = err.into();
        assert!(matches!(
            top,
            TapflowError::Config(ConfigError::InvalidValue { .. })
        ));

        let err: StreamProcessorError = RegistryError::NoTopics {
            name: "logs".to_owned(),
        }
        .into();
        assert!(matches!(TapflowError::from(err), TapflowError::Registry(_)));
    }
}
