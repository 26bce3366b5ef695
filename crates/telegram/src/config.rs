//! 텔레그램 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`FunkwacheConfig`]에서 파이프라인이
//! 필요로 하는 값만 추려 담습니다.
//!
//! # 사용 예시
//! ```
//! use funkwache_core::config::FunkwacheConfig;
//! use funkwache_telegram::config::PipelineConfig;
//!
//! let core = FunkwacheConfig::default();
//! let config = PipelineConfig::from_core(&core);
//! assert_eq!(config.fms_window_secs, 10);
//! ```

use serde::{Deserialize, Serialize};

use funkwache_core::config::FunkwacheConfig;

use crate::error::TelegramError;

/// 텔레그램 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 감시 주파수 (Hz) — 생성되는 모든 이벤트에 실립니다.
    pub frequency_hz: u64,
    /// FMS 이중 알람 윈도우 (초). 0이면 억제 비활성화.
    pub fms_window_secs: u64,
    /// ZVEI 이중 알람 윈도우 (초). 0이면 억제 비활성화.
    pub zvei_window_secs: u64,
    /// FMS 상태 코드 설명 조회 활성화
    pub fms_describe: bool,
    /// ZVEI 코드 설명 조회 활성화
    pub zvei_describe: bool,
    /// POCSAG RIC 설명 조회 활성화
    pub pocsag_describe: bool,
    /// 플러그인별 전달 타임아웃 (초)
    pub delivery_timeout_secs: u64,
    /// 종료 시 진행 중 전달 유예 시간 (초)
    pub shutdown_grace_secs: u64,
    /// 라인 채널 용량
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 85_405_000,
            fms_window_secs: 10,
            zvei_window_secs: 10,
            fms_describe: false,
            zvei_describe: false,
            pocsag_describe: false,
            delivery_timeout_secs: 10,
            shutdown_grace_secs: 5,
            channel_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &FunkwacheConfig) -> Self {
        Self {
            frequency_hz: core.receiver.frequency_hz,
            fms_window_secs: core.fms.double_alarm_window_secs,
            zvei_window_secs: core.zvei.double_alarm_window_secs,
            fms_describe: core.fms.describe,
            zvei_describe: core.zvei.describe,
            pocsag_describe: core.pocsag.describe,
            delivery_timeout_secs: core.dispatch.delivery_timeout_secs,
            shutdown_grace_secs: core.dispatch.shutdown_grace_secs,
            channel_capacity: core.dispatch.channel_capacity,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), TelegramError> {
        if self.frequency_hz == 0 {
            return Err(TelegramError::Config {
                field: "frequency_hz".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.delivery_timeout_secs == 0 {
            return Err(TelegramError::Config {
                field: "delivery_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(TelegramError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}
