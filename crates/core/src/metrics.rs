//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `funkwache_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(funkwache_core::metrics::LINES_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 프로토콜 레이블 키 (FMS, ZVEI, POCSAG)
pub const LABEL_PROTOCOL: &str = "protocol";

/// 플러그인 레이블 키
pub const LABEL_PLUGIN: &str = "plugin";

// ─── Telegram Pipeline 메트릭 ──────────────────────────────────────

/// 수신된 전체 디코더 라인 수 (counter)
pub const LINES_RECEIVED_TOTAL: &str = "funkwache_lines_received_total";

/// 파싱/검증 실패로 버려진 텔레그램 수 (counter, label: protocol)
pub const TELEGRAMS_REJECTED_TOTAL: &str = "funkwache_telegrams_rejected_total";

/// 중복 억제로 버려진 알람 수 (counter, label: protocol)
pub const ALARMS_SUPPRESSED_TOTAL: &str = "funkwache_alarms_suppressed_total";

/// 디스패치된 알람 수 (counter, label: protocol)
pub const ALARMS_DISPATCHED_TOTAL: &str = "funkwache_alarms_dispatched_total";

// ─── Dispatcher 메트릭 ─────────────────────────────────────────────

/// 성공한 플러그인 전달 수 (counter, label: plugin)
pub const PLUGIN_DELIVERIES_TOTAL: &str = "funkwache_plugin_deliveries_total";

/// 실패한 플러그인 전달 수 (counter, label: plugin)
pub const PLUGIN_DELIVERY_FAILURES_TOTAL: &str = "funkwache_plugin_delivery_failures_total";

/// 타임아웃된 플러그인 전달 수 (counter, label: plugin)
pub const PLUGIN_DELIVERY_TIMEOUTS_TOTAL: &str = "funkwache_plugin_delivery_timeouts_total";

/// 필터에 걸러진 전달 수 (counter, label: plugin)
pub const PLUGIN_FILTERED_TOTAL: &str = "funkwache_plugin_filtered_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후, 파이프라인 시작 전에 한 번 호출합니다.
pub fn describe_metrics() {
    use metrics::describe_counter;

    describe_counter!(LINES_RECEIVED_TOTAL, "Decoder lines received");
    describe_counter!(
        TELEGRAMS_REJECTED_TOTAL,
        "Telegrams discarded by parse/validation failure"
    );
    describe_counter!(
        ALARMS_SUPPRESSED_TOTAL,
        "Alarms suppressed as double alarms"
    );
    describe_counter!(ALARMS_DISPATCHED_TOTAL, "Alarms handed to the dispatcher");
    describe_counter!(PLUGIN_DELIVERIES_TOTAL, "Successful plugin deliveries");
    describe_counter!(PLUGIN_DELIVERY_FAILURES_TOTAL, "Failed plugin deliveries");
    describe_counter!(
        PLUGIN_DELIVERY_TIMEOUTS_TOTAL,
        "Plugin deliveries aborted by timeout"
    );
    describe_counter!(PLUGIN_FILTERED_TOTAL, "Deliveries gated out by filter rules");
}
