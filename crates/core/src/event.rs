//! 알람 이벤트 — 파이프라인 전체가 공유하는 출력 단위
//!
//! 디코더 라인이 파싱을 통과하면 [`AlarmEvent`] 하나가 생성됩니다.
//! 페이로드는 프로토콜별 전용 타입([`AlarmPayload`])으로, 한 이벤트가
//! 다른 프로토콜 계열의 필드를 함께 가질 수 없습니다.
//! 플러그인/필터 경계에서는 [`AlarmEvent::fields`]가 제공하는
//! key-value 목록을 교환 형식으로 사용합니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 지원 프로토콜 계열
///
/// 디코더 라인의 접두사로 식별됩니다:
/// `FMS:`, `ZVEI2:`, `POCSAG512:`/`POCSAG1200:`/`POCSAG2400:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// FMS 상태 텔레그램
    Fms,
    /// ZVEI 5-Ton 시퀀스
    Zvei,
    /// POCSAG 페이징 텔레그램
    Pocsag,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fms => write!(f, "FMS"),
            Self::Zvei => write!(f, "ZVEI"),
            Self::Pocsag => write!(f, "POCSAG"),
        }
    }
}

/// FMS 방향 비트 — 텔레그램의 전송 방향
///
/// `0` = 차량에서 지령실로, `1` = 지령실에서 차량으로.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FmsDirection {
    /// 차량 -> 지령실 (비트 0)
    VehicleToControl,
    /// 지령실 -> 차량 (비트 1)
    ControlToVehicle,
}

impl FmsDirection {
    /// 방향 비트 문자('0'/'1')에서 변환합니다.
    pub fn from_bit(bit: char) -> Option<Self> {
        match bit {
            '0' => Some(Self::VehicleToControl),
            '1' => Some(Self::ControlToVehicle),
            _ => None,
        }
    }

    /// 방향 비트 문자를 반환합니다.
    pub fn as_bit(self) -> char {
        match self {
            Self::VehicleToControl => '0',
            Self::ControlToVehicle => '1',
        }
    }

    /// 조회 테이블과 무관하게 고정된, 사람이 읽는 방향 문구
    pub fn text(self) -> &'static str {
        match self {
            Self::VehicleToControl => "FZG -> LST",
            Self::ControlToVehicle => "LST -> FZG",
        }
    }
}

/// POCSAG 비트레이트 변종
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitRate {
    /// 512 bit/s
    B512,
    /// 1200 bit/s
    B1200,
    /// 2400 bit/s
    B2400,
}

impl fmt::Display for BitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B512 => write!(f, "512"),
            Self::B1200 => write!(f, "1200"),
            Self::B2400 => write!(f, "2400"),
        }
    }
}

/// FMS 상태 텔레그램 페이로드
///
/// 고정 폭 텔레그램 덤프의 열 위치에서 추출된 필드들입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmsTelegram {
    /// 기관 코드 (1문자)
    pub service: String,
    /// 지역 코드 (1문자)
    pub region: String,
    /// 장소 코드 (2자리)
    pub location: String,
    /// 차량 번호 (4자리)
    pub vehicle: String,
    /// 상태 코드 (1문자)
    pub status: String,
    /// 전송 방향
    pub direction: FmsDirection,
    /// 전술 단축 정보 (3문자)
    pub tactical_info: String,
    /// 상태 코드 설명 (enrichment 활성화 시 설정)
    pub status_text: Option<String>,
}

impl FmsTelegram {
    /// 중복 판정 식별자:
    /// service+region+location+vehicle+status+direction 비트 (10문자)
    pub fn identity(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.service,
            self.region,
            self.location,
            self.vehicle,
            self.status,
            self.direction.as_bit(),
        )
    }
}

/// ZVEI 5-Ton 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZveiTelegram {
    /// 반복음 `F`가 해소된 5자리 코드
    pub code: String,
    /// 코드 설명 (enrichment 활성화 시 설정)
    pub description: Option<String>,
}

/// POCSAG 페이징 페이로드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocsagTelegram {
    /// 수신 주소 (RIC), 7자리로 0-패딩
    pub ric: String,
    /// 기능 코드 (0..=3)
    pub function: u8,
    /// 메시지 본문 (없으면 빈 문자열)
    pub message: String,
    /// 디코딩에 사용된 비트레이트
    pub bit_rate: BitRate,
    /// RIC 설명 (enrichment 활성화 시 설정)
    pub description: Option<String>,
}

/// 프로토콜별 전용 페이로드
///
/// 태그된 합 타입이므로 이벤트가 다른 계열의 필드를 섞어 가질 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmPayload {
    /// FMS 상태 텔레그램
    Fms(FmsTelegram),
    /// ZVEI 5-Ton
    Zvei(ZveiTelegram),
    /// POCSAG 페이징
    Pocsag(PocsagTelegram),
}

impl AlarmPayload {
    /// 페이로드가 속한 프로토콜 계열
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Fms(_) => Protocol::Fms,
            Self::Zvei(_) => Protocol::Zvei,
            Self::Pocsag(_) => Protocol::Pocsag,
        }
    }
}

/// 구조화된 알람 이벤트 — 파이프라인의 출력 단위
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmEvent {
    /// 이벤트 고유 ID (UUID v4)
    pub id: String,
    /// 프로토콜 계열
    pub protocol: Protocol,
    /// 감시 중인 채널 주파수 (Hz, 실행 중 상수)
    pub frequency_hz: u64,
    /// 이벤트 생성 시각
    pub timestamp: SystemTime,
    /// 프로토콜별 페이로드
    pub payload: AlarmPayload,
}

impl AlarmEvent {
    /// 새 알람 이벤트를 생성합니다. 프로토콜은 페이로드에서 파생됩니다.
    pub fn new(frequency_hz: u64, payload: AlarmPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            protocol: payload.protocol(),
            frequency_hz,
            timestamp: SystemTime::now(),
            payload,
        }
    }

    /// 중복 판정 식별자.
    ///
    /// POCSAG는 설계상 모든 페이지가 서로 다른 알람이므로 `None`입니다.
    pub fn identity(&self) -> Option<String> {
        match &self.payload {
            AlarmPayload::Fms(fms) => Some(fms.identity()),
            AlarmPayload::Zvei(zvei) => Some(zvei.code.clone()),
            AlarmPayload::Pocsag(_) => None,
        }
    }

    /// 필터 규칙 및 플러그인 경계용 key-value 교환 표현.
    ///
    /// 키는 항상 해당 프로토콜 계열의 것만 포함됩니다.
    /// 설명 계열 키는 enrichment 미적용 시 원시 코드로 폴백됩니다.
    pub fn fields(&self) -> Vec<(String, String)> {
        match &self.payload {
            AlarmPayload::Fms(fms) => vec![
                ("fms".to_owned(), fms.identity()),
                ("service".to_owned(), fms.service.clone()),
                ("region".to_owned(), fms.region.clone()),
                ("location".to_owned(), fms.location.clone()),
                ("vehicle".to_owned(), fms.vehicle.clone()),
                ("status".to_owned(), fms.status.clone()),
                ("direction".to_owned(), fms.direction.as_bit().to_string()),
                ("direction_text".to_owned(), fms.direction.text().to_owned()),
                ("tactical_info".to_owned(), fms.tactical_info.clone()),
                (
                    "status_text".to_owned(),
                    fms.status_text
                        .clone()
                        .unwrap_or_else(|| fms.status.clone()),
                ),
            ],
            AlarmPayload::Zvei(zvei) => vec![
                ("zvei".to_owned(), zvei.code.clone()),
                (
                    "description".to_owned(),
                    zvei.description
                        .clone()
                        .unwrap_or_else(|| zvei.code.clone()),
                ),
            ],
            AlarmPayload::Pocsag(poc) => vec![
                ("ric".to_owned(), poc.ric.clone()),
                ("function".to_owned(), poc.function.to_string()),
                ("message".to_owned(), poc.message.clone()),
                ("bit_rate".to_owned(), poc.bit_rate.to_string()),
                (
                    "description".to_owned(),
                    poc.description.clone().unwrap_or_else(|| poc.ric.clone()),
                ),
            ],
        }
    }

    /// 이름으로 단일 교환 필드를 조회합니다.
    pub fn field(&self, name: &str) -> Option<String> {
        self.fields()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for AlarmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            AlarmPayload::Fms(fms) => write!(
                f,
                "AlarmEvent[{}] FMS service={} region={} location={} vehicle={} status={} {} tsi={}",
                &self.id[..8.min(self.id.len())],
                fms.service,
                fms.region,
                fms.location,
                fms.vehicle,
                fms.status,
                fms.direction.text(),
                fms.tactical_info,
            ),
            AlarmPayload::Zvei(zvei) => write!(
                f,
                "AlarmEvent[{}] ZVEI code={}",
                &self.id[..8.min(self.id.len())],
                zvei.code,
            ),
            AlarmPayload::Pocsag(poc) => write!(
                f,
                "AlarmEvent[{}] POCSAG{} ric={} function={} msg={}",
                &self.id[..8.min(self.id.len())],
                poc.bit_rate,
                poc.ric,
                poc.function,
                poc.message,
            ),
        }
    }
}
