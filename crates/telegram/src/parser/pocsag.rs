//! POCSAG 페이징 텔레그램 파서
//!
//! 세 비트레이트 변종(512/1200/2400)은 접두사만 다르고 필드 추출
//! 로직을 공유합니다. multimon-ng 덤프의 섹션 마커를 기준으로
//! 추출합니다:
//!
//! ```text
//! POCSAG1200: Address: 1234567  Function: 0  Alpha:   Probealarm Stadtmitte
//! ```
//!
//! 메시지는 `Alpha:` 또는 `Numeric:` 뒤의 텍스트이며, 톤 전용 페이지는
//! 메시지 섹션이 없어 빈 메시지가 됩니다.

use funkwache_core::event::{AlarmPayload, BitRate, PocsagTelegram, Protocol};
use regex::Regex;

use super::TelegramParser;
use crate::error::TelegramError;

/// 비트레이트별 프로토콜 인식 마커
const MARKERS: &[(&str, BitRate)] = &[
    ("POCSAG512:", BitRate::B512),
    ("POCSAG1200:", BitRate::B1200),
    ("POCSAG2400:", BitRate::B2400),
];

const ADDRESS_MARKER: &str = "Address:";
const FUNCTION_MARKER: &str = "Function:";
const ALPHA_MARKER: &str = "Alpha:";
const NUMERIC_MARKER: &str = "Numeric:";

/// RIC는 최대 7자리 숫자입니다.
const ADDRESS_PATTERN: &str = "^[0-9]{1,7}$";

/// POCSAG 페이징 파서 (비트레이트 3종 공용)
pub struct PocsagParser {
    /// 주소 검증 패턴 (생성 시 1회 컴파일)
    address_pattern: Regex,
}

impl PocsagParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            address_pattern: Regex::new(ADDRESS_PATTERN).expect("static POCSAG pattern"),
        }
    }

    fn bit_rate(line: &str) -> Option<BitRate> {
        MARKERS
            .iter()
            .find(|(marker, _)| line.contains(marker))
            .map(|(_, rate)| *rate)
    }

    /// 섹션 마커 뒤의 첫 토큰을 반환합니다.
    fn token_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
        let (_, rest) = line.split_once(marker)?;
        rest.split_whitespace().next()
    }

    /// 섹션 마커 뒤의 나머지 전체를 반환합니다 (메시지 본문).
    fn text_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
        line.split_once(marker).map(|(_, rest)| rest.trim())
    }
}

impl Default for PocsagParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramParser for PocsagParser {
    fn protocol(&self) -> Protocol {
        Protocol::Pocsag
    }

    fn recognizes(&self, line: &str) -> bool {
        Self::bit_rate(line).is_some()
    }

    fn parse(&self, line: &str) -> Result<AlarmPayload, TelegramError> {
        let invalid = |value: &str| TelegramError::PatternInvalid {
            protocol: Protocol::Pocsag,
            value: value.to_owned(),
        };

        let bit_rate = Self::bit_rate(line).ok_or_else(|| invalid(line.trim()))?;

        let address =
            Self::token_after(line, ADDRESS_MARKER).ok_or_else(|| invalid(line.trim()))?;
        if !self.address_pattern.is_match(address) {
            return Err(invalid(address));
        }
        let ric = format!("{address:0>7}");

        let function_token =
            Self::token_after(line, FUNCTION_MARKER).ok_or_else(|| invalid(line.trim()))?;
        let function = match function_token {
            "0" => 0,
            "1" => 1,
            "2" => 2,
            "3" => 3,
            other => return Err(invalid(other)),
        };

        // Alpha가 우선, 없으면 Numeric, 둘 다 없으면 톤 전용 페이지
        let message = Self::text_after(line, ALPHA_MARKER)
            .or_else(|| Self::text_after(line, NUMERIC_MARKER))
            .unwrap_or("")
            .to_owned();

        Ok(AlarmPayload::Pocsag(PocsagTelegram {
            ric,
            function,
            message,
            bit_rate,
            description: None,
        }))
    }
}
