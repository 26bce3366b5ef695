//! 파이프라인 오케스트레이션 -- 라인 수신부터 디스패치까지의 전체 흐름
//!
//! [`TelegramPipeline`]은 시작 시 한 번 조립되는 명시적 컨텍스트
//! 객체입니다. 숨은 전역 상태 없이 파서 라우터, 중복 저장소, 설명
//! 테이블, 디스패처를 소유하고 단일 수집 루프에서 사용합니다.
//!
//! # 내부 아키텍처
//! ```text
//! LineCollector -> mpsc -> ParserRouter -> DedupStore -> enrich -> Dispatcher
//! ```
//!
//! 라인 처리는 수신 순서 그대로 순차적입니다 — 중복 억제의 슬라이딩
//! 윈도우는 같은 프로토콜의 라인이 순서대로 처리될 때만 올바릅니다.
//! 전달만 플러그인별 태스크로 비동기입니다.
//!
//! # 라인별 상태 기계
//! ```text
//! Received -> Parsed | Rejected
//! Parsed   -> Suppressed | Accepted
//! Accepted -> Enriched -> Dispatched
//! ```
//! 종결 상태는 Rejected, Suppressed, Dispatched이며 재시도는 없습니다.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use funkwache_core::event::{AlarmEvent, AlarmPayload, Protocol};
use funkwache_core::metrics::{
    ALARMS_DISPATCHED_TOTAL, ALARMS_SUPPRESSED_TOTAL, LABEL_PROTOCOL, LINES_RECEIVED_TOTAL,
    TELEGRAMS_REJECTED_TOTAL,
};
use funkwache_core::plugin::DynAlarmPlugin;

use crate::config::PipelineConfig;
use crate::dedup::{DedupDecision, DedupStore};
use crate::describe::DescriptionTable;
use crate::dispatch::Dispatcher;
use crate::error::TelegramError;
use crate::filter::{FilterEngine, FilterRule};
use crate::parser::ParserRouter;
use crate::source::RawLine;

/// 텔레그램 파이프라인
pub struct TelegramPipeline {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 프로토콜 파서 라우터
    router: ParserRouter,
    /// 이중 알람 저장소
    dedup: DedupStore,
    /// 설명 조회 테이블
    descriptions: DescriptionTable,
    /// 플러그인 팬아웃
    dispatcher: Dispatcher,
    /// 라인 수신 채널
    line_rx: mpsc::Receiver<RawLine>,
    /// 종료 신호
    cancel: CancellationToken,
    /// 수신 라인 수
    received_count: u64,
    /// 거부된 텔레그램 수
    rejected_count: u64,
    /// 억제된 알람 수
    suppressed_count: u64,
    /// 디스패치된 알람 수
    dispatched_count: u64,
}

impl TelegramPipeline {
    /// 수집 루프를 실행합니다.
    ///
    /// 취소되거나 라인 소스가 닫힐 때까지 라인을 순서대로 처리합니다.
    /// 파싱/검증 실패는 라인 단위로 로깅되고 루프는 계속됩니다 —
    /// 잘못된 라인 하나가 스트림을 중단시키지 않습니다.
    pub async fn run(&mut self) -> Result<(), TelegramError> {
        tracing::info!(
            frequency_hz = self.config.frequency_hz,
            plugins = self.dispatcher.plugin_count(),
            "telegram pipeline started"
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("telegram pipeline cancelled");
                    break;
                }
                line = self.line_rx.recv() => {
                    match line {
                        Some(raw) => self.process_line(raw),
                        None => {
                            tracing::info!("line source closed, stopping pipeline");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// 디코더 라인 하나를 처리합니다.
    fn process_line(&mut self, raw: RawLine) {
        self.received_count += 1;
        counter!(LINES_RECEIVED_TOTAL).increment(1);

        let text = String::from_utf8_lossy(&raw.data);

        let payload = match self.router.parse(&text) {
            Ok(payload) => payload,
            Err(TelegramError::UnknownProtocol) => {
                // multimon-ng의 상태 출력 등 텔레그램이 아닌 라인
                tracing::trace!(line = %text, "line not recognized as telegram");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, line = %text, "telegram rejected");
                self.rejected_count += 1;
                counter!(TELEGRAMS_REJECTED_TOTAL, LABEL_PROTOCOL => protocol_label(&e))
                    .increment(1);
                return;
            }
        };

        let mut event = AlarmEvent::new(self.config.frequency_hz, payload);

        if let Some(identity) = event.identity()
            && self.dedup.observe(event.protocol, &identity, event.timestamp)
                == DedupDecision::Suppressed
        {
            tracing::info!(
                protocol = %event.protocol,
                identity = %identity,
                "double alarm suppressed"
            );
            self.suppressed_count += 1;
            counter!(ALARMS_SUPPRESSED_TOTAL, LABEL_PROTOCOL => event.protocol.to_string())
                .increment(1);
            return;
        }

        self.enrich(&mut event);

        tracing::info!(%event, "alarm accepted");
        self.dispatched_count += 1;
        counter!(ALARMS_DISPATCHED_TOTAL, LABEL_PROTOCOL => event.protocol.to_string())
            .increment(1);
        self.dispatcher.dispatch(event);
    }

    /// 설정이 허용하는 프로토콜에 설명 조회를 적용합니다.
    fn enrich(&self, event: &mut AlarmEvent) {
        match &mut event.payload {
            AlarmPayload::Fms(fms) if self.config.fms_describe => {
                fms.status_text =
                    Some(self.descriptions.describe(Protocol::Fms, &fms.status));
            }
            AlarmPayload::Zvei(zvei) if self.config.zvei_describe => {
                zvei.description =
                    Some(self.descriptions.describe(Protocol::Zvei, &zvei.code));
            }
            AlarmPayload::Pocsag(poc) if self.config.pocsag_describe => {
                poc.description =
                    Some(self.descriptions.describe(Protocol::Pocsag, &poc.ric));
            }
            _ => {}
        }
    }

    /// 진행 중 전달에 유예 시간을 주고 디스패처를 종료합니다.
    pub async fn shutdown(&mut self) {
        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        self.dispatcher.shutdown(grace).await;
        tracing::info!(
            received = self.received_count,
            rejected = self.rejected_count,
            suppressed = self.suppressed_count,
            dispatched = self.dispatched_count,
            "telegram pipeline stopped"
        );
    }

    /// 수신 라인 수를 반환합니다.
    pub fn received_count(&self) -> u64 {
        self.received_count
    }

    /// 거부된 텔레그램 수를 반환합니다.
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count
    }

    /// 억제된 알람 수를 반환합니다.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count
    }

    /// 디스패치된 알람 수를 반환합니다.
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched_count
    }
}

/// 거부 카운터의 프로토콜 레이블 — 파서가 판별한 프로토콜이 있으면
/// 그 이름, 없으면 "unknown"입니다.
fn protocol_label(error: &TelegramError) -> String {
    match error {
        TelegramError::PatternInvalid { protocol, .. } => protocol.to_string(),
        TelegramError::IntegrityFailed => Protocol::Fms.to_string(),
        _ => "unknown".to_owned(),
    }
}

/// 텔레그램 파이프라인 빌더
///
/// 파이프라인을 구성하고 라인 송신 채널을 생성합니다. 필터 규칙과
/// 설명 테이블은 호출자가 시작 시 로드하여 넘깁니다 — 로딩 실패는
/// 파이프라인이 만들어지기 전에 드러나야 합니다.
pub struct TelegramPipelineBuilder {
    config: PipelineConfig,
    plugins: Vec<Arc<dyn DynAlarmPlugin>>,
    filter_rules: Vec<FilterRule>,
    descriptions: DescriptionTable,
    cancel: CancellationToken,
}

impl TelegramPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            plugins: Vec::new(),
            filter_rules: Vec::new(),
            descriptions: DescriptionTable::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 디스패치 대상 플러그인을 지정합니다 (등록 순서 보존).
    pub fn plugins(mut self, plugins: Vec<Arc<dyn DynAlarmPlugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    /// 로드된 필터 규칙을 지정합니다.
    pub fn filter_rules(mut self, rules: Vec<FilterRule>) -> Self {
        self.filter_rules = rules;
        self
    }

    /// 로드된 설명 테이블을 지정합니다.
    pub fn descriptions(mut self, descriptions: DescriptionTable) -> Self {
        self.descriptions = descriptions;
        self
    }

    /// 종료 토큰을 지정합니다.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `TelegramPipeline`: 파이프라인 인스턴스
    /// - `mpsc::Sender<RawLine>`: 라인 소스가 사용할 송신 채널
    pub fn build(self) -> Result<(TelegramPipeline, mpsc::Sender<RawLine>), TelegramError> {
        self.config.validate()?;

        // 잘못된 정규식은 여기서 fail-fast로 드러납니다.
        let filter = FilterEngine::from_rules(self.filter_rules)?;

        let (line_tx, line_rx) = mpsc::channel(self.config.channel_capacity);

        let dispatcher = Dispatcher::new(
            self.plugins,
            filter,
            Duration::from_secs(self.config.delivery_timeout_secs),
        );

        let dedup = DedupStore::new(self.config.fms_window_secs, self.config.zvei_window_secs);

        let pipeline = TelegramPipeline {
            config: self.config,
            router: ParserRouter::with_defaults(),
            dedup,
            descriptions: self.descriptions,
            dispatcher,
            line_rx,
            cancel: self.cancel,
            received_count: 0,
            rejected_count: 0,
            suppressed_count: 0,
            dispatched_count: 0,
        };

        Ok((pipeline, line_tx))
    }
}

impl Default for TelegramPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
