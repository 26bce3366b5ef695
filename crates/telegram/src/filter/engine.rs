//! 필터 평가 로직 -- (프로토콜, 플러그인) 쌍 범위의 OR 매칭
//!
//! [`FilterEngine`]은 로드된 규칙의 정규식을 시작 시 한 번 컴파일해
//! 보관합니다. 평가 시 해당 쌍의 규칙이 하나도 없으면 통과이고,
//! 있으면 하나라도 매칭될 때 통과입니다. 규칙 평가 순서는 결과에
//! 영향이 없지만 진단을 위해 규칙별 판정을 debug로 남깁니다.

use funkwache_core::event::{AlarmEvent, Protocol};
use regex::Regex;

use super::types::FilterRule;
use crate::error::TelegramError;

/// 컴파일된 규칙
struct CompiledRule {
    rule: FilterRule,
    regex: Regex,
}

/// 필터 엔진
pub struct FilterEngine {
    rules: Vec<CompiledRule>,
}

impl FilterEngine {
    /// 규칙 없는 엔진을 생성합니다 — 모든 조합이 통과합니다.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// 규칙 목록에서 엔진을 생성합니다.
    ///
    /// 정규식 컴파일 실패는 시작 시점의 설정 결함이므로 에러를
    /// 반환합니다 (fail-fast).
    pub fn from_rules(rules: Vec<FilterRule>) -> Result<Self, TelegramError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&rule.pattern).map_err(|e| TelegramError::FilterValidation {
                name: rule.name.clone(),
                reason: format!("invalid regex '{}': {e}", rule.pattern),
            })?;
            compiled.push(CompiledRule { rule, regex });
        }
        Ok(Self { rules: compiled })
    }

    /// (프로토콜, 플러그인) 쌍에 대해 이벤트 필드 목록을 평가합니다.
    ///
    /// `fields`는 [`AlarmEvent::fields`]의 결과입니다. 디스패처가
    /// 이벤트당 한 번 계산하여 플러그인마다 재사용합니다.
    pub fn passes(&self, protocol: Protocol, fields: &[(String, String)], plugin: &str) -> bool {
        let mut found = false;

        for compiled in self
            .rules
            .iter()
            .filter(|c| c.rule.protocol == protocol && c.rule.plugin == plugin)
        {
            found = true;
            let value = fields
                .iter()
                .find(|(key, _)| key == &compiled.rule.field)
                .map(|(_, value)| value.as_str());

            match value {
                Some(value) if compiled.regex.is_match(value) => {
                    tracing::debug!(
                        rule = %compiled.rule.name,
                        plugin,
                        "filter passed"
                    );
                    return true;
                }
                Some(_) => {
                    tracing::debug!(
                        rule = %compiled.rule.name,
                        plugin,
                        "filter not passed"
                    );
                }
                None => {
                    // 규칙이 존재하지 않는 필드를 가리키면 매칭 실패로
                    // 취급합니다.
                    tracing::debug!(
                        rule = %compiled.rule.name,
                        field = %compiled.rule.field,
                        plugin,
                        "filter field absent"
                    );
                }
            }
        }

        if found {
            tracing::debug!(%protocol, plugin, "no filter passed");
            false
        } else {
            // 쌍에 대한 규칙이 없으면 무필터 — 통과
            true
        }
    }

    /// 이벤트에 대한 편의 래퍼입니다.
    pub fn passes_event(&self, event: &AlarmEvent, plugin: &str) -> bool {
        self.passes(event.protocol, &event.fields(), plugin)
    }

    /// 로드된 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funkwache_core::event::{AlarmPayload, FmsDirection, FmsTelegram, ZveiTelegram};

    fn rule(name: &str, protocol: Protocol, field: &str, plugin: &str, pattern: &str) -> FilterRule {
        FilterRule {
            name: name.to_owned(),
            protocol,
            field: field.to_owned(),
            plugin: plugin.to_owned(),
            pattern: pattern.to_owned(),
        }
    }

    fn fms_event(status: &str) -> AlarmEvent {
        AlarmEvent::new(
            85_405_000,
            AlarmPayload::Fms(FmsTelegram {
                service: "9".to_owned(),
                region: "3".to_owned(),
                location: "25".to_owned(),
                vehicle: "7141".to_owned(),
                status: status.to_owned(),
                direction: FmsDirection::VehicleToControl,
                tactical_info: "III".to_owned(),
                status_text: None,
            }),
        )
    }

    fn zvei_event(code: &str) -> AlarmEvent {
        AlarmEvent::new(
            172_500_000,
            AlarmPayload::Zvei(ZveiTelegram {
                code: code.to_owned(),
                description: None,
            }),
        )
    }

    #[test]
    fn no_rules_means_pass_through() {
        let engine = FilterEngine::new();
        assert!(engine.passes_event(&fms_event("3"), "console"));
    }

    #[test]
    fn no_rule_for_pair_passes() {
        // 다른 플러그인만 대상인 규칙은 이 플러그인을 제한하지 않습니다.
        let engine =
            FilterEngine::from_rules(vec![rule("r", Protocol::Fms, "status", "archive", "^3$")])
                .unwrap();
        assert!(engine.passes_event(&fms_event("1"), "console"));
    }

    #[test]
    fn matching_rule_passes() {
        let engine =
            FilterEngine::from_rules(vec![rule("r", Protocol::Fms, "status", "archive", "^3$")])
                .unwrap();
        assert!(engine.passes_event(&fms_event("3"), "archive"));
    }

    #[test]
    fn non_matching_rule_gates_out() {
        let engine =
            FilterEngine::from_rules(vec![rule("r", Protocol::Fms, "status", "archive", "^3$")])
                .unwrap();
        assert!(!engine.passes_event(&fms_event("1"), "archive"));
    }

    #[test]
    fn rules_for_same_pair_are_or_combined() {
        let engine = FilterEngine::from_rules(vec![
            rule("a", Protocol::Zvei, "zvei", "console", "^111"),
            rule("b", Protocol::Zvei, "zvei", "console", "^258"),
        ])
        .unwrap();
        assert!(engine.passes_event(&zvei_event("25832"), "console"));
        assert!(engine.passes_event(&zvei_event("11100"), "console"));
        assert!(!engine.passes_event(&zvei_event("99999"), "console"));
    }

    #[test]
    fn rule_order_does_not_affect_result() {
        let forward = FilterEngine::from_rules(vec![
            rule("a", Protocol::Zvei, "zvei", "console", "^111"),
            rule("b", Protocol::Zvei, "zvei", "console", "^258"),
        ])
        .unwrap();
        let reversed = FilterEngine::from_rules(vec![
            rule("b", Protocol::Zvei, "zvei", "console", "^258"),
            rule("a", Protocol::Zvei, "zvei", "console", "^111"),
        ])
        .unwrap();
        for code in ["25832", "11100", "99999"] {
            assert_eq!(
                forward.passes_event(&zvei_event(code), "console"),
                reversed.passes_event(&zvei_event(code), "console"),
            );
        }
    }

    #[test]
    fn rules_scope_by_protocol() {
        // ZVEI 규칙은 같은 플러그인의 FMS 이벤트를 제한하지 않습니다.
        let engine =
            FilterEngine::from_rules(vec![rule("r", Protocol::Zvei, "zvei", "console", "^258")])
                .unwrap();
        assert!(engine.passes_event(&fms_event("3"), "console"));
    }

    #[test]
    fn absent_field_does_not_match() {
        let engine =
            FilterEngine::from_rules(vec![rule("r", Protocol::Zvei, "ric", "console", ".*")])
                .unwrap();
        assert!(!engine.passes_event(&zvei_event("25832"), "console"));
    }

    #[test]
    fn invalid_regex_fails_at_construction() {
        let result =
            FilterEngine::from_rules(vec![rule("bad", Protocol::Fms, "status", "x", "[invalid")]);
        let err = result.err().expect("construction should fail");
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn rule_count_reports_loaded_rules() {
        let engine = FilterEngine::from_rules(vec![
            rule("a", Protocol::Zvei, "zvei", "console", "^1"),
            rule("b", Protocol::Fms, "status", "console", "^2"),
        ])
        .unwrap();
        assert_eq!(engine.rule_count(), 2);
    }
}
