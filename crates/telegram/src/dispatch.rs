//! 디스패처 -- 필터를 통과한 플러그인으로의 격리된 팬아웃
//!
//! 등록 순서대로 각 플러그인의 필터를 평가하고, 통과한 전달을
//! 플러그인별 tokio 태스크로 띄웁니다. 전달은 설정된 타임아웃으로
//! 제한되며, 실패·타임아웃은 해당 플러그인에만 국한됩니다 — 다음
//! 플러그인 전달과 파이프라인은 계속됩니다. 재시도는 없습니다
//! (재시도 정책은 플러그인 자신의 몫입니다).
//!
//! 전달이 비동기로 진행되므로 느린 플러그인이 새 텔레그램 수집을
//! 막지 않습니다. 종료 시에는 진행 중 전달에 유예 시간을 주고,
//! 초과분은 중단합니다.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinSet;

use funkwache_core::event::AlarmEvent;
use funkwache_core::metrics::{
    LABEL_PLUGIN, PLUGIN_DELIVERIES_TOTAL, PLUGIN_DELIVERY_FAILURES_TOTAL,
    PLUGIN_DELIVERY_TIMEOUTS_TOTAL, PLUGIN_FILTERED_TOTAL,
};
use funkwache_core::plugin::DynAlarmPlugin;

use crate::filter::FilterEngine;

/// 알람 이벤트 디스패처
pub struct Dispatcher {
    /// 등록 순서의 공유 플러그인 핸들
    plugins: Vec<Arc<dyn DynAlarmPlugin>>,
    /// 플러그인별 전달 게이트
    filter: FilterEngine,
    /// 플러그인별 전달 타임아웃
    delivery_timeout: Duration,
    /// 진행 중인 전달 태스크
    inflight: JoinSet<()>,
}

impl Dispatcher {
    /// 새 디스패처를 생성합니다.
    pub fn new(
        plugins: Vec<Arc<dyn DynAlarmPlugin>>,
        filter: FilterEngine,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            plugins,
            filter,
            delivery_timeout,
            inflight: JoinSet::new(),
        }
    }

    /// 이벤트 하나를 모든 플러그인에 팬아웃합니다.
    ///
    /// 필터 평가는 동기이고 전달은 플러그인별 태스크로 진행됩니다.
    /// 이 메서드는 전달 완료를 기다리지 않습니다.
    pub fn dispatch(&mut self, event: AlarmEvent) {
        // 끝난 전달 태스크를 수거합니다 (패닉은 이미 태스크 안에서
        // 격리되어 있습니다).
        while self.inflight.try_join_next().is_some() {}

        let fields = event.fields();
        let event = Arc::new(event);

        for plugin in &self.plugins {
            let name = plugin.info().name.clone();

            if !self.filter.passes(event.protocol, &fields, &name) {
                tracing::debug!(plugin = %name, event = %event.id, "delivery gated out by filter");
                counter!(PLUGIN_FILTERED_TOTAL, LABEL_PLUGIN => name).increment(1);
                continue;
            }

            let plugin = Arc::clone(plugin);
            let event = Arc::clone(&event);
            let timeout = self.delivery_timeout;

            self.inflight.spawn(async move {
                match tokio::time::timeout(timeout, plugin.deliver(&event)).await {
                    Ok(Ok(())) => {
                        tracing::debug!(plugin = %name, event = %event.id, "delivered");
                        counter!(PLUGIN_DELIVERIES_TOTAL, LABEL_PLUGIN => name).increment(1);
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            plugin = %name,
                            event = %event.id,
                            error = %e,
                            "delivery failed"
                        );
                        counter!(PLUGIN_DELIVERY_FAILURES_TOTAL, LABEL_PLUGIN => name)
                            .increment(1);
                    }
                    Err(_) => {
                        tracing::warn!(
                            plugin = %name,
                            event = %event.id,
                            timeout_secs = timeout.as_secs(),
                            "delivery timed out"
                        );
                        counter!(PLUGIN_DELIVERY_TIMEOUTS_TOTAL, LABEL_PLUGIN => name)
                            .increment(1);
                    }
                }
            });
        }
    }

    /// 진행 중인 전달에 유예 시간을 주고 종료합니다.
    ///
    /// 유예 시간 내에 끝나지 않은 전달은 중단됩니다 — 프로세스 종료를
    /// 무한정 막지 않습니다.
    pub async fn shutdown(&mut self, grace: Duration) {
        let drain = async {
            while self.inflight.join_next().await.is_some() {}
        };

        if tokio::time::timeout(grace, drain).await.is_err() {
            let remaining = self.inflight.len();
            tracing::warn!(remaining, "abandoning in-flight deliveries after grace period");
            self.inflight.abort_all();
            while self.inflight.join_next().await.is_some() {}
        }
    }

    /// 등록된 플러그인 수를 반환합니다.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// 현재 진행 중인 전달 태스크 수를 반환합니다.
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}
