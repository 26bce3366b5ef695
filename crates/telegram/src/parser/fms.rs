//! FMS 상태 텔레그램 파서
//!
//! multimon-ng의 FMSFSK 복조기가 출력하는 고정 폭 텔레그램 덤프를
//! 파싱합니다. 필드는 문서화된 열 위치에서 추출되며, 덤프 뒤쪽의
//! `CRC correct` 마커가 상위 디코더의 무결성 판정을 전달합니다.
//!
//! # 덤프 레이아웃 (열 위치)
//! ```text
//! 열 19      기관 코드 (1문자)
//! 열 36      지역 코드 (1문자)
//! 열 65..67  장소 코드 (2자리)
//! 열 72..76  차량 번호 (4자리)
//! 열 84      상태 코드 (1문자)
//! 열 101     방향 비트 (0/1)
//! 열 114..117 전술 단축 정보 (3문자)
//! ```

use funkwache_core::event::{AlarmPayload, FmsDirection, FmsTelegram, Protocol};
use regex::Regex;

use super::TelegramParser;
use crate::error::TelegramError;

/// 프로토콜 인식 마커
const MARKER: &str = "FMS:";
/// 상위 디코더의 무결성 판정 마커
const INTEGRITY_MARKER: &str = "CRC correct";

/// service+region+location+vehicle+status+direction 연접의 검증 패턴.
/// 2 hex 문자(기관+지역), 6자리(장소+차량), 1 hex 문자(상태), 1 방향 비트.
const ID_PATTERN: &str = "^[0-9a-f]{2}[0-9]{6}[0-9a-f][01]$";

const SERVICE: usize = 19;
const REGION: usize = 36;
const LOCATION: std::ops::Range<usize> = 65..67;
const VEHICLE: std::ops::Range<usize> = 72..76;
const STATUS: usize = 84;
const DIRECTION: usize = 101;
const TACTICAL_INFO: std::ops::Range<usize> = 114..117;

/// FMS 상태 텔레그램 파서
pub struct FmsParser {
    /// 식별자 검증 패턴 (생성 시 1회 컴파일)
    id_pattern: Regex,
}

impl FmsParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            // 고정 패턴이므로 컴파일은 실패할 수 없습니다.
            id_pattern: Regex::new(ID_PATTERN).expect("static FMS pattern"),
        }
    }

    fn slice<'a>(line: &'a str, range: std::ops::Range<usize>) -> Option<&'a str> {
        line.get(range)
    }
}

impl Default for FmsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramParser for FmsParser {
    fn protocol(&self) -> Protocol {
        Protocol::Fms
    }

    fn recognizes(&self, line: &str) -> bool {
        line.contains(MARKER)
    }

    fn parse(&self, line: &str) -> Result<AlarmPayload, TelegramError> {
        // CRC 판정이 없는 텔레그램은 필드를 읽지 않고 버립니다.
        if !line.contains(INTEGRITY_MARKER) {
            return Err(TelegramError::IntegrityFailed);
        }

        let invalid = || TelegramError::PatternInvalid {
            protocol: Protocol::Fms,
            value: line.trim().to_owned(),
        };

        let service = Self::slice(line, SERVICE..SERVICE + 1).ok_or_else(invalid)?;
        let region = Self::slice(line, REGION..REGION + 1).ok_or_else(invalid)?;
        let location = Self::slice(line, LOCATION).ok_or_else(invalid)?;
        let vehicle = Self::slice(line, VEHICLE).ok_or_else(invalid)?;
        let status = Self::slice(line, STATUS..STATUS + 1).ok_or_else(invalid)?;
        let direction = Self::slice(line, DIRECTION..DIRECTION + 1).ok_or_else(invalid)?;
        let tactical_info = Self::slice(line, TACTICAL_INFO).ok_or_else(invalid)?;

        let identity = format!("{service}{region}{location}{vehicle}{status}{direction}");
        if !self.id_pattern.is_match(&identity) {
            return Err(TelegramError::PatternInvalid {
                protocol: Protocol::Fms,
                value: identity,
            });
        }

        // 패턴이 방향 문자를 [01]로 보장합니다.
        let direction_bit = direction.chars().next().and_then(FmsDirection::from_bit);
        let direction = direction_bit.ok_or_else(|| TelegramError::PatternInvalid {
            protocol: Protocol::Fms,
            value: identity.clone(),
        })?;

        Ok(AlarmPayload::Fms(FmsTelegram {
            service: service.to_owned(),
            region: region.to_owned(),
            location: location.to_owned(),
            vehicle: vehicle.to_owned(),
            status: status.to_owned(),
            direction,
            tactical_info: tactical_info.to_owned(),
            status_text: None,
        }))
    }
}
