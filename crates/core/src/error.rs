//! 에러 타입 — 도메인별 에러 정의

/// Funkwache 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FunkwacheError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 플러그인 에러
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

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

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 채널 통신 실패
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,
}

/// 플러그인 에러
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// 동일 이름의 플러그인이 이미 등록됨
    #[error("plugin already registered: {name}")]
    AlreadyRegistered { name: String },

    /// 플러그인을 찾을 수 없음
    #[error("plugin not found: {name}")]
    NotFound { name: String },

    /// 플러그인 초기화 실패
    #[error("plugin '{name}' init failed: {reason}")]
    InitFailed { name: String, reason: String },

    /// 전달 실패 — 해당 플러그인에만 국한되며 파이프라인은 계속됩니다
    #[error("plugin '{name}' delivery failed: {reason}")]
    DeliveryFailed { name: String, reason: String },

    /// 전달 시간 초과
    #[error("plugin '{name}' delivery timed out after {secs}s")]
    DeliveryTimeout { name: String, secs: u64 },

    /// 정지 실패 (수집된 에러 목록)
    #[error("plugin stop failed: {0}")]
    StopFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "must be one of: trace, debug, info, warn, error".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("general.log_level"));
        assert!(msg.contains("must be one of"));
    }

    #[test]
    fn plugin_error_converts_to_funkwache_error() {
        let err: FunkwacheError = PluginError::NotFound {
            name: "console".to_owned(),
        }
        .into();
        assert!(matches!(err, FunkwacheError::Plugin(_)));
        assert!(err.to_string().contains("console"));
    }

    #[test]
    fn delivery_timeout_display() {
        let err = PluginError::DeliveryTimeout {
            name: "archive".to_owned(),
            secs: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("archive"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FunkwacheError = io.into();
        assert!(matches!(err, FunkwacheError::Io(_)));
    }
}
