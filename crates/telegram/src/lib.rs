//! Funkwache 텔레그램 파이프라인 크레이트
//!
//! 외부 디코더(rtl_fm | multimon-ng)가 출력하는 텔레그램 덤프 라인을
//! 구조화된 알람 이벤트로 바꾸고, 이중 알람을 억제하고, 선택적으로
//! 설명을 붙인 뒤, 필터를 통과한 플러그인들로 팬아웃합니다.
//!
//! # 모듈 구성
//!
//! - [`source`]: 디코더 출력 스트림의 라인 수집
//! - [`parser`]: FMS / ZVEI / POCSAG 파서 및 접두사 라우터
//! - [`dedup`]: 프로토콜별 슬라이딩 윈도우 이중 알람 억제
//! - [`describe`]: 코드 -> 설명 enrichment 테이블
//! - [`filter`]: (프로토콜, 플러그인) 범위의 정규식 게이트
//! - [`dispatch`]: 플러그인별 격리 팬아웃
//! - [`pipeline`]: 전체 흐름 오케스트레이션
//! - [`config`]: 파이프라인 설정
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LineCollector -> ParserRouter -> DedupStore -> describe -> Dispatcher
//!      |                |              |                        |
//!  rtl_fm|multimon   FMS/ZVEI/POC   sliding window        per-plugin task
//! ```

pub mod config;
pub mod dedup;
pub mod describe;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod source;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{TelegramPipeline, TelegramPipelineBuilder};

// 설정
pub use config::PipelineConfig;

// 에러
pub use error::TelegramError;

// 파서
pub use parser::{FmsParser, ParserRouter, PocsagParser, TelegramParser, ZveiParser};

// 중복 억제
pub use dedup::{DedupDecision, DedupStore};

// 필터
pub use filter::{FilterEngine, FilterLoader, FilterRule};

// 설명 조회
pub use describe::DescriptionTable;

// 디스패치
pub use dispatch::Dispatcher;

// 라인 소스
pub use source::{LineCollector, RawLine};
