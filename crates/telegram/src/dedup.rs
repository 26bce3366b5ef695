//! 이중 알람 억제 -- 프로토콜별 슬라이딩 윈도우 중복 제거
//!
//! 아날로그 망에서는 같은 알람이 짧은 간격으로 재전송되므로, 직전에
//! 수락한 식별자와 같은 알람이 윈도우 안에 다시 오면 억제합니다.
//! 억제할 때마다 저장된 시각이 현재로 갱신되는 슬라이딩 윈도우입니다:
//! 동일 텔레그램이 연속되는 동안에는 계속 억제되고, 마지막 반복 이후
//! 윈도우만큼 조용해야 같은 식별자가 새 알람으로 수락됩니다.
//!
//! POCSAG는 설계상 모든 페이지가 서로 다른 알람이므로 억제하지 않습니다.

use std::time::{Duration, SystemTime};

use funkwache_core::event::Protocol;

/// 중복 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// 새 알람으로 수락
    Accepted,
    /// 이중 알람으로 억제
    Suppressed,
}

/// 프로토콜 하나의 중복 추적 슬롯
#[derive(Debug)]
struct ProtocolSlot {
    /// 억제 윈도우. 0이면 억제 비활성화.
    window: Duration,
    /// 마지막으로 수락/갱신된 (식별자, 시각)
    last: Option<(String, SystemTime)>,
    /// 수락된 알람 수
    accepted: u64,
    /// 억제된 알람 수
    suppressed: u64,
}

impl ProtocolSlot {
    fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::from_secs(window_secs),
            last: None,
            accepted: 0,
            suppressed: 0,
        }
    }

    fn observe(&mut self, identity: &str, now: SystemTime) -> DedupDecision {
        if let Some((last_identity, last_seen)) = &mut self.last
            && last_identity.as_str() == identity
            && now < *last_seen + self.window
        {
            // 반복마다 윈도우를 갱신합니다 — 다음 동일 알람은 마지막
            // 반복 이후 윈도우만큼 기다려야 수락됩니다.
            *last_seen = now;
            self.suppressed += 1;
            return DedupDecision::Suppressed;
        }

        self.last = Some((identity.to_owned(), now));
        self.accepted += 1;
        DedupDecision::Accepted
    }
}

/// 프로토콜별 이중 알람 억제 저장소
///
/// 단일 수집 태스크가 가변으로 소유하므로 잠금이 필요 없습니다.
/// 재시작 간에는 보존되지 않습니다.
pub struct DedupStore {
    fms: ProtocolSlot,
    zvei: ProtocolSlot,
    /// POCSAG 수락 수 (억제 없음, 집계만)
    pocsag_accepted: u64,
}

impl DedupStore {
    /// 프로토콜별 윈도우(초)로 저장소를 생성합니다.
    pub fn new(fms_window_secs: u64, zvei_window_secs: u64) -> Self {
        Self {
            fms: ProtocolSlot::new(fms_window_secs),
            zvei: ProtocolSlot::new(zvei_window_secs),
            pocsag_accepted: 0,
        }
    }

    /// 알람 하나를 관찰하고 수락/억제를 판정합니다.
    ///
    /// 수락이면 해당 프로토콜 슬롯이 새 식별자/시각으로 갱신되고,
    /// 억제면 저장된 시각만 `now`로 갱신됩니다.
    pub fn observe(&mut self, protocol: Protocol, identity: &str, now: SystemTime) -> DedupDecision {
        match protocol {
            Protocol::Fms => self.fms.observe(identity, now),
            Protocol::Zvei => self.zvei.observe(identity, now),
            Protocol::Pocsag => {
                self.pocsag_accepted += 1;
                DedupDecision::Accepted
            }
        }
    }

    /// 프로토콜별 수락 수를 반환합니다.
    pub fn accepted_count(&self, protocol: Protocol) -> u64 {
        match protocol {
            Protocol::Fms => self.fms.accepted,
            Protocol::Zvei => self.zvei.accepted,
            Protocol::Pocsag => self.pocsag_accepted,
        }
    }

    /// 프로토콜별 억제 수를 반환합니다.
    pub fn suppressed_count(&self, protocol: Protocol) -> u64 {
        match protocol {
            Protocol::Fms => self.fms.suppressed,
            Protocol::Zvei => self.zvei.suppressed,
            Protocol::Pocsag => 0,
        }
    }
}
