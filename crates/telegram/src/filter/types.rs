//! 필터 규칙 데이터 타입
//!
//! YAML 규칙 파일에서 역직렬화되는 구조체들을 정의합니다.

use funkwache_core::event::Protocol;
use serde::{Deserialize, Serialize};

use crate::error::TelegramError;

/// 필터 규칙 -- (프로토콜, 플러그인) 쌍으로 범위가 정해집니다.
///
/// 같은 쌍을 대상으로 하는 규칙이 여러 개면 OR로 결합됩니다.
///
/// # YAML 스키마
/// ```yaml
/// filters:
///   - name: only_status_3
///     protocol: fms
///     field: status
///     plugin: archive
///     pattern: "^3$"
///   - name: own_loop
///     protocol: zvei
///     field: zvei
///     plugin: console
///     pattern: "^258"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    /// 규칙 이름 (진단 로그에 표시)
    pub name: String,
    /// 대상 프로토콜 계열
    pub protocol: Protocol,
    /// 검사할 이벤트 필드명 (`AlarmEvent::fields`의 키)
    pub field: String,
    /// 대상 플러그인 이름
    pub plugin: String,
    /// 필드 값에 적용할 정규식
    pub pattern: String,
}

impl FilterRule {
    /// 규칙의 유효성을 검증합니다.
    ///
    /// 정규식 컴파일은 엔진이 수행합니다. 여기서는 구조적 결함만
    /// 확인합니다.
    pub fn validate(&self) -> Result<(), TelegramError> {
        if self.name.is_empty() {
            return Err(TelegramError::FilterValidation {
                name: "(empty)".to_owned(),
                reason: "rule name must not be empty".to_owned(),
            });
        }
        if self.field.is_empty() {
            return Err(TelegramError::FilterValidation {
                name: self.name.clone(),
                reason: "field must not be empty".to_owned(),
            });
        }
        if self.plugin.is_empty() {
            return Err(TelegramError::FilterValidation {
                name: self.name.clone(),
                reason: "target plugin must not be empty".to_owned(),
            });
        }
        if self.pattern.is_empty() {
            return Err(TelegramError::FilterValidation {
                name: self.name.clone(),
                reason: "pattern must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// 필터 규칙 파일의 최상위 구조
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRuleFile {
    /// 규칙 목록
    #[serde(default)]
    pub filters: Vec<FilterRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rule() -> FilterRule {
        FilterRule {
            name: "only_status_3".to_owned(),
            protocol: Protocol::Fms,
            field: "status".to_owned(),
            plugin: "archive".to_owned(),
            pattern: "^3$".to_owned(),
        }
    }

    #[test]
    fn valid_rule_passes_validation() {
        sample_rule().validate().unwrap();
    }

    #[test]
    fn empty_name_fails_validation() {
        let mut rule = sample_rule();
        rule.name = String::new();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn empty_field_fails_validation() {
        let mut rule = sample_rule();
        rule.field = String::new();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn empty_plugin_fails_validation() {
        let mut rule = sample_rule();
        rule.plugin = String::new();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn empty_pattern_fails_validation() {
        let mut rule = sample_rule();
        rule.pattern = String::new();
        assert!(rule.validate().is_err());
    }

    #[test]
    fn rule_from_yaml() {
        let yaml = r#"
filters:
  - name: only_own_loop
    protocol: zvei
    field: zvei
    plugin: console
    pattern: "^258"
  - name: status_alarm
    protocol: fms
    field: status
    plugin: archive
    pattern: "^[34]$"
"#;
        let file: FilterRuleFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.filters.len(), 2);
        assert_eq!(file.filters[0].protocol, Protocol::Zvei);
        assert_eq!(file.filters[1].pattern, "^[34]$");
    }

    #[test]
    fn empty_file_has_no_rules() {
        let file: FilterRuleFile = serde_yaml::from_str("filters: []").unwrap();
        assert!(file.filters.is_empty());
    }

    #[test]
    fn rule_serialization_roundtrip() {
        let rule = sample_rule();
        let yaml = serde_yaml::to_string(&rule).unwrap();
        let back: FilterRule = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.name, rule.name);
        assert_eq!(back.protocol, rule.protocol);
    }
}
