//! 설정 관리 — funkwache.toml 파싱 및 런타임 설정
//!
//! [`FunkwacheConfig`]는 수신기, 프로토콜별 중복 억제 윈도우, 필터,
//! 플러그인 목록 등 모든 섹션을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FUNKWACHE_GENERAL_LOG_LEVEL=debug` 형식)
//! 3. 설정 파일 (`funkwache.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), funkwache_core::error::FunkwacheError> {
//! use funkwache_core::config::FunkwacheConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FunkwacheConfig::load("funkwache.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FunkwacheConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FunkwacheError};

/// 유효한 멀티몬 복조기 이름
pub const VALID_DEMODULATORS: &[&str] = &["fms", "zvei", "poc512", "poc1200", "poc2400"];

/// Funkwache 통합 설정
///
/// `funkwache.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunkwacheConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수신기/디코더 체인 설정
    #[serde(default)]
    pub receiver: ReceiverConfig,
    /// FMS 프로토콜 설정
    #[serde(default)]
    pub fms: FmsConfig,
    /// ZVEI 프로토콜 설정
    #[serde(default)]
    pub zvei: ZveiConfig,
    /// POCSAG 프로토콜 설정
    #[serde(default)]
    pub pocsag: PocsagConfig,
    /// 필터 규칙 설정
    #[serde(default)]
    pub filter: FilterConfig,
    /// 디스패치 설정
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// 출력 플러그인 목록 (순서 보존)
    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginEntry>,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 미사용)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 수신기/디코더 체인 설정
///
/// rtl_fm과 multimon-ng에 전달되는 값들입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// 감시 주파수 (Hz)
    pub frequency_hz: u64,
    /// SDR 장치 인덱스
    pub device_index: u32,
    /// 장치 주파수 오차 (PPM)
    pub error_ppm: i32,
    /// 스켈치 레벨
    pub squelch: u32,
    /// 활성화할 복조기 (fms, zvei, poc512, poc1200, poc2400)
    pub demodulators: Vec<String>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 85_405_000,
            device_index: 0,
            error_ppm: 0,
            squelch: 0,
            demodulators: vec!["fms".to_owned(), "zvei".to_owned(), "poc1200".to_owned()],
        }
    }
}

/// FMS 프로토콜 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FmsConfig {
    /// 동일 텔레그램 중복 억제 윈도우 (초). 0이면 억제 비활성화.
    pub double_alarm_window_secs: u64,
    /// 상태 코드 설명 조회 활성화
    pub describe: bool,
    /// 설명 테이블 파일 (YAML, `describe = true`일 때 필수)
    pub description_file: String,
}

impl Default for FmsConfig {
    fn default() -> Self {
        Self {
            double_alarm_window_secs: 10,
            describe: false,
            description_file: String::new(),
        }
    }
}

/// ZVEI 프로토콜 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZveiConfig {
    /// 동일 코드 중복 억제 윈도우 (초). 0이면 억제 비활성화.
    pub double_alarm_window_secs: u64,
    /// 코드 설명 조회 활성화
    pub describe: bool,
    /// 설명 테이블 파일 (YAML, `describe = true`일 때 필수)
    pub description_file: String,
}

impl Default for ZveiConfig {
    fn default() -> Self {
        Self {
            double_alarm_window_secs: 10,
            describe: false,
            description_file: String::new(),
        }
    }
}

/// POCSAG 프로토콜 설정 — 페이징은 설계상 중복 억제가 없습니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PocsagConfig {
    /// RIC 설명 조회 활성화
    #[serde(default)]
    pub describe: bool,
    /// 설명 테이블 파일 (YAML, `describe = true`일 때 필수)
    #[serde(default)]
    pub description_file: String,
}

/// 필터 규칙 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 필터 규칙 파일 (YAML). 빈 문자열이면 필터 없음 — 전부 통과.
    #[serde(default)]
    pub rule_file: String,
}

/// 디스패치 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 플러그인별 전달 타임아웃 (초)
    pub delivery_timeout_secs: u64,
    /// 종료 시 진행 중 전달에 허용하는 유예 시간 (초)
    pub shutdown_grace_secs: u64,
    /// 라인 채널 용량
    pub channel_capacity: usize,
    /// 허용 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_secs: 10,
            shutdown_grace_secs: 5,
            channel_capacity: 1024,
            max_line_length: 4096,
        }
    }
}

/// 출력 플러그인 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEntry {
    /// 플러그인 이름 (필터 규칙의 대상 지정에 사용, 유일해야 함)
    pub name: String,
    /// 플러그인 종류 (console, jsonl)
    pub kind: String,
    /// 출력 파일 경로 (jsonl 전용)
    #[serde(default)]
    pub path: String,
}

impl FunkwacheConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FunkwacheError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FunkwacheError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FunkwacheError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FunkwacheError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FunkwacheError> {
        toml::from_str(toml_str).map_err(|e| {
            FunkwacheError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 네이밍 규칙: `FUNKWACHE_{SECTION}_{FIELD}`
    /// 예: `FUNKWACHE_RECEIVER_FREQUENCY_HZ=172500000`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FUNKWACHE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FUNKWACHE_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "FUNKWACHE_GENERAL_PID_FILE");

        // Receiver
        override_u64(
            &mut self.receiver.frequency_hz,
            "FUNKWACHE_RECEIVER_FREQUENCY_HZ",
        );
        override_u32(
            &mut self.receiver.device_index,
            "FUNKWACHE_RECEIVER_DEVICE_INDEX",
        );
        override_i32(&mut self.receiver.error_ppm, "FUNKWACHE_RECEIVER_ERROR_PPM");
        override_u32(&mut self.receiver.squelch, "FUNKWACHE_RECEIVER_SQUELCH");
        override_csv(
            &mut self.receiver.demodulators,
            "FUNKWACHE_RECEIVER_DEMODULATORS",
        );

        // FMS / ZVEI / POCSAG
        override_u64(
            &mut self.fms.double_alarm_window_secs,
            "FUNKWACHE_FMS_DOUBLE_ALARM_WINDOW_SECS",
        );
        override_bool(&mut self.fms.describe, "FUNKWACHE_FMS_DESCRIBE");
        override_string(
            &mut self.fms.description_file,
            "FUNKWACHE_FMS_DESCRIPTION_FILE",
        );
        override_u64(
            &mut self.zvei.double_alarm_window_secs,
            "FUNKWACHE_ZVEI_DOUBLE_ALARM_WINDOW_SECS",
        );
        override_bool(&mut self.zvei.describe, "FUNKWACHE_ZVEI_DESCRIBE");
        override_string(
            &mut self.zvei.description_file,
            "FUNKWACHE_ZVEI_DESCRIPTION_FILE",
        );
        override_bool(&mut self.pocsag.describe, "FUNKWACHE_POCSAG_DESCRIBE");
        override_string(
            &mut self.pocsag.description_file,
            "FUNKWACHE_POCSAG_DESCRIPTION_FILE",
        );

        // Filter
        override_string(&mut self.filter.rule_file, "FUNKWACHE_FILTER_RULE_FILE");

        // Dispatch
        override_u64(
            &mut self.dispatch.delivery_timeout_secs,
            "FUNKWACHE_DISPATCH_DELIVERY_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.dispatch.shutdown_grace_secs,
            "FUNKWACHE_DISPATCH_SHUTDOWN_GRACE_SECS",
        );
        override_usize(
            &mut self.dispatch.channel_capacity,
            "FUNKWACHE_DISPATCH_CHANNEL_CAPACITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FunkwacheError> {
        const MAX_CHANNEL_CAPACITY: usize = 1_000_000;
        const MAX_DELIVERY_TIMEOUT_SECS: u64 = 300;

        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.receiver.frequency_hz == 0 {
            return Err(ConfigError::InvalidValue {
                field: "receiver.frequency_hz".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.receiver.demodulators.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "receiver.demodulators".to_owned(),
                reason: "at least one demodulator must be enabled".to_owned(),
            }
            .into());
        }
        for demod in &self.receiver.demodulators {
            if !VALID_DEMODULATORS.contains(&demod.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "receiver.demodulators".to_owned(),
                    reason: format!(
                        "unknown demodulator '{}', must be one of: {}",
                        demod,
                        VALID_DEMODULATORS.join(", ")
                    ),
                }
                .into());
            }
        }

        if self.dispatch.delivery_timeout_secs == 0
            || self.dispatch.delivery_timeout_secs > MAX_DELIVERY_TIMEOUT_SECS
        {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.delivery_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_DELIVERY_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.dispatch.channel_capacity == 0
            || self.dispatch.channel_capacity > MAX_CHANNEL_CAPACITY
        {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            }
            .into());
        }

        if self.dispatch.max_line_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        // 설명 조회가 켜져 있으면 테이블 파일이 있어야 합니다.
        for (section, describe, file) in [
            ("fms", self.fms.describe, &self.fms.description_file),
            ("zvei", self.zvei.describe, &self.zvei.description_file),
            ("pocsag", self.pocsag.describe, &self.pocsag.description_file),
        ] {
            if describe && file.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{section}.description_file"),
                    reason: "must be set when describe is enabled".to_owned(),
                }
                .into());
            }
        }

        // 플러그인 항목 검증 — 빈 목록은 허용됩니다 (출력 없음).
        let valid_kinds = ["console", "jsonl"];
        let mut seen = std::collections::HashSet::new();
        for entry in &self.plugins {
            if entry.name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "plugin.name".to_owned(),
                    reason: "plugin name must not be empty".to_owned(),
                }
                .into());
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "plugin.name".to_owned(),
                    reason: format!("duplicate plugin name '{}'", entry.name),
                }
                .into());
            }
            if !valid_kinds.contains(&entry.kind.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("plugin '{}' kind", entry.name),
                    reason: format!("must be one of: {}", valid_kinds.join(", ")),
                }
                .into());
            }
            if entry.kind == "jsonl" && entry.path.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("plugin '{}' path", entry.name),
                    reason: "jsonl plugin requires a path".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value, "ignoring unparsable bool env override"),
        }
    }
}

fn override_u64(target: &mut u64, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value, "ignoring unparsable integer env override"),
        }
    }
}

fn override_u32(target: &mut u32, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value, "ignoring unparsable integer env override"),
        }
    }
}

fn override_i32(target: &mut i32, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value, "ignoring unparsable integer env override"),
        }
    }
}

fn override_usize(target: &mut usize, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value, "ignoring unparsable integer env override"),
        }
    }
}

fn override_csv(target: &mut Vec<String>, var: &str) {
    if let Ok(value) = std::env::var(var) {
        *target = value
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
