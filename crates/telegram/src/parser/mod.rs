//! 텔레그램 파싱 모듈 -- 프로토콜 계열별 파서
//!
//! [`ParserRouter`]는 디코더 라인의 프로토콜 접두사를 판별하여 적절한
//! 파서를 선택합니다. 각 파서는 고정 열 위치에서 필드를 추출하고
//! 프로토콜 검증 패턴으로 결과를 확인하는 순수 함수입니다.
//!
//! # 지원 프로토콜
//! - FMS 상태 텔레그램 ([`FmsParser`])
//! - ZVEI 5-Ton 시퀀스 ([`ZveiParser`])
//! - POCSAG 페이징, 비트레이트 3종 ([`PocsagParser`])
//!
//! # 사용 예시
//! ```
//! use funkwache_telegram::parser::ParserRouter;
//!
//! let router = ParserRouter::with_defaults();
//! let payload = router.parse("ZVEI2: 25832").unwrap();
//! ```

pub mod fms;
pub mod pocsag;
pub mod zvei;

pub use fms::FmsParser;
pub use pocsag::PocsagParser;
pub use zvei::ZveiParser;

use funkwache_core::event::{AlarmPayload, Protocol};

use crate::error::TelegramError;

/// 프로토콜 계열별 파서 trait
///
/// 새로운 텔레그램 프로토콜을 지원하려면 이 trait을 구현합니다.
pub trait TelegramParser: Send + Sync {
    /// 파서가 담당하는 프로토콜 계열
    fn protocol(&self) -> Protocol;

    /// 라인이 이 파서의 프로토콜 접두사를 담고 있는지 여부
    fn recognizes(&self, line: &str) -> bool;

    /// 디코더 라인 하나를 페이로드로 파싱합니다.
    ///
    /// `recognizes`가 참인 라인에 대해서만 호출됩니다.
    fn parse(&self, line: &str) -> Result<AlarmPayload, TelegramError>;
}

/// 파서 라우터 -- 접두사로 프로토콜을 판별하여 파서를 선택합니다.
///
/// 등록된 파서 목록을 순회하며, 라인을 인식하는 첫 번째 파서에
/// 파싱을 위임합니다. 아무 파서도 인식하지 못하면
/// [`TelegramError::UnknownProtocol`]을 반환합니다 — multimon-ng는
/// 텔레그램 외의 상태 라인도 출력하므로 이는 정상 경로입니다.
pub struct ParserRouter {
    /// 등록된 파서 목록 (순서대로 시도)
    parsers: Vec<Box<dyn TelegramParser>>,
}

impl ParserRouter {
    /// 빈 라우터를 생성합니다.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// 기본 파서 세트(FMS + ZVEI + POCSAG)로 라우터를 생성합니다.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(FmsParser::new()))
            .register(Box::new(ZveiParser::new()))
            .register(Box::new(PocsagParser::new()))
    }

    /// 파서를 등록합니다. 등록 순서대로 시도됩니다.
    pub fn register(mut self, parser: Box<dyn TelegramParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// 디코더 라인을 파싱합니다.
    pub fn parse(&self, line: &str) -> Result<AlarmPayload, TelegramError> {
        for parser in &self.parsers {
            if parser.recognizes(line) {
                return parser.parse(line);
            }
        }
        Err(TelegramError::UnknownProtocol)
    }

    /// 등록된 파서의 프로토콜 목록을 반환합니다.
    pub fn registered_protocols(&self) -> Vec<Protocol> {
        self.parsers.iter().map(|p| p.protocol()).collect()
    }
}

impl Default for ParserRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_router_rejects_everything() {
        let router = ParserRouter::new();
        assert!(matches!(
            router.parse("ZVEI2: 25832"),
            Err(TelegramError::UnknownProtocol)
        ));
    }

    #[test]
    fn with_defaults_registers_all_protocols() {
        let router = ParserRouter::with_defaults();
        let protocols = router.registered_protocols();
        assert!(protocols.contains(&Protocol::Fms));
        assert!(protocols.contains(&Protocol::Zvei));
        assert!(protocols.contains(&Protocol::Pocsag));
    }

    #[test]
    fn unrecognized_line_is_unknown_protocol() {
        let router = ParserRouter::with_defaults();
        let result = router.parse("multimon-ng: Enabled demodulators: ZVEI2");
        assert!(matches!(result, Err(TelegramError::UnknownProtocol)));
    }

    #[test]
    fn routes_zvei_line() {
        let router = ParserRouter::with_defaults();
        let payload = router.parse("ZVEI2: 25832").unwrap();
        assert_eq!(payload.protocol(), Protocol::Zvei);
    }

    #[test]
    fn routes_pocsag_line() {
        let router = ParserRouter::with_defaults();
        let payload = router
            .parse("POCSAG1200: Address: 1234567  Function: 0  Alpha:   Probealarm")
            .unwrap();
        assert_eq!(payload.protocol(), Protocol::Pocsag);
    }

    // 파서 강건성: 임의 입력에 절대 패닉하지 않아야 합니다.
    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_arbitrary_string_does_not_panic(line in "\\PC{0,200}") {
                let router = ParserRouter::with_defaults();
                let _ = router.parse(&line);
            }

            #[test]
            fn parse_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
                let router = ParserRouter::with_defaults();
                let line = String::from_utf8_lossy(&bytes);
                let _ = router.parse(&line);
            }
        }
    }
}
