//! ZVEI 5-Ton 시퀀스 파서
//!
//! `ZVEI2:` 라인에서 5자리 코드를 추출합니다. 아날로그 인코딩의
//! 반복음 규약 때문에 같은 음이 연속되면 디코더가 `F`를 출력하므로,
//! 각 `F`를 바로 앞 문자로 치환한 뒤 검증합니다.
//!
//! ```text
//! ZVEI2: 25F32  ->  25532
//! ```

use funkwache_core::event::{AlarmPayload, Protocol, ZveiTelegram};
use regex::Regex;

use super::TelegramParser;
use crate::error::TelegramError;

/// 프로토콜 인식 마커
const MARKER: &str = "ZVEI2:";
/// 코드 열 위치
const CODE: std::ops::Range<usize> = 7..12;
/// 해소된 코드의 검증 패턴
const CODE_PATTERN: &str = "^[0-9]{5}$";

/// ZVEI 5-Ton 파서
pub struct ZveiParser {
    /// 코드 검증 패턴 (생성 시 1회 컴파일)
    code_pattern: Regex,
}

impl ZveiParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self {
            code_pattern: Regex::new(CODE_PATTERN).expect("static ZVEI pattern"),
        }
    }
}

impl Default for ZveiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 반복음 `F`를 해소합니다.
///
/// 위치 1부터 왼쪽에서 오른쪽으로 진행하며 `F`를 (이미 해소된) 바로 앞
/// 문자로 치환합니다. 연속된 `F`는 순차적으로 전파됩니다
/// (`2FFFF` -> `22222`). 위치 0의 `F`는 앞 문자가 없으므로 그대로
/// 남고, 이어지는 숫자 검증에서 거부됩니다.
pub fn resolve_repeat_tone(code: &str) -> String {
    let mut chars: Vec<char> = code.chars().collect();
    for i in 1..chars.len() {
        if chars[i] == 'F' {
            chars[i] = chars[i - 1];
        }
    }
    chars.into_iter().collect()
}

impl TelegramParser for ZveiParser {
    fn protocol(&self) -> Protocol {
        Protocol::Zvei
    }

    fn recognizes(&self, line: &str) -> bool {
        line.contains(MARKER)
    }

    fn parse(&self, line: &str) -> Result<AlarmPayload, TelegramError> {
        let raw = line.get(CODE).ok_or_else(|| TelegramError::PatternInvalid {
            protocol: Protocol::Zvei,
            value: line.trim().to_owned(),
        })?;

        let code = resolve_repeat_tone(raw);
        if !self.code_pattern.is_match(&code) {
            return Err(TelegramError::PatternInvalid {
                protocol: Protocol::Zvei,
                value: code,
            });
        }

        Ok(AlarmPayload::Zvei(ZveiTelegram {
            code,
            description: None,
        }))
    }
}
