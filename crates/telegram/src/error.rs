//! 텔레그램 파이프라인 에러 타입
//!
//! [`TelegramError`]는 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<TelegramError> for FunkwacheError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 파싱/검증 실패는 라인 단위로 국한되는 비치명 에러입니다. 시작 시점의
//! 설정 손상(필터/설명 테이블 로딩 실패)만 치명적입니다.

use funkwache_core::error::{FunkwacheError, PipelineError};
use funkwache_core::event::Protocol;

/// 텔레그램 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// 상위 디코더의 무결성 마커가 없음 (FMS `CRC correct`)
    #[error("integrity check failed: upstream CRC marker missing")]
    IntegrityFailed,

    /// 추출된 필드가 프로토콜 검증 패턴에 맞지 않음
    ///
    /// `value`는 진단을 위해 문제의 문자열을 그대로 담습니다.
    #[error("invalid {protocol} telegram: '{value}'")]
    PatternInvalid {
        /// 거부한 프로토콜
        protocol: Protocol,
        /// 문제의 추출 값
        value: String,
    },

    /// 어떤 파서도 라인을 인식하지 못함
    #[error("no parser recognizes line")]
    UnknownProtocol,

    /// 필터 규칙 파일 로딩 실패
    #[error("filter load error: {path}: {reason}")]
    FilterLoad {
        /// 규칙 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 필터 규칙 유효성 검증 실패
    #[error("filter rule '{name}': {reason}")]
    FilterValidation {
        /// 문제가 된 규칙 이름
        name: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설명 테이블 로딩 실패
    #[error("description table load error: {path}: {reason}")]
    DescriptionLoad {
        /// 테이블 파일 경로
        path: String,
        /// 실패 사유
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

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl TelegramError {
    /// 라인 단위로 국한되는 비치명 에러인지 여부.
    ///
    /// 파이프라인은 이런 에러를 로깅만 하고 다음 라인으로 진행합니다.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IntegrityFailed | Self::PatternInvalid { .. } | Self::UnknownProtocol
        )
    }
}

impl From<TelegramError> for FunkwacheError {
    fn from(err: TelegramError) -> Self {
        FunkwacheError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
