//! 필터 규칙 파일 로더 -- YAML 규칙 파일을 디스크에서 로드합니다.
//!
//! 규칙 테이블은 시작 시 한 번 로드됩니다. 깨진 규칙 테이블은 조용히
//! 무시하면 알람이 의도와 다르게 흘러가므로, 어떤 결함이든 시작을
//! 실패시킵니다 (fail-fast).

use std::collections::HashSet;
use std::path::Path;

use crate::error::TelegramError;

use super::types::{FilterRule, FilterRuleFile};

/// 규칙 파일 최대 크기
const MAX_RULE_FILE_SIZE: u64 = 1024 * 1024; // 1MB

/// 필터 규칙 파일 로더
pub struct FilterLoader;

impl FilterLoader {
    /// 단일 YAML 파일에서 규칙 목록을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Vec<FilterRule>, TelegramError> {
        let path = path.as_ref();

        let metadata =
            tokio::fs::metadata(path)
                .await
                .map_err(|e| TelegramError::FilterLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file metadata: {e}"),
                })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(TelegramError::FilterLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| TelegramError::FilterLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        let rules = Self::parse_yaml(&content, &path.display().to_string())?;

        tracing::info!(
            path = %path.display(),
            count = rules.len(),
            "loaded filter rules"
        );

        Ok(rules)
    }

    /// YAML 문자열을 파싱하여 규칙 목록을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Vec<FilterRule>, TelegramError> {
        let file: FilterRuleFile =
            serde_yaml::from_str(yaml_str).map_err(|e| TelegramError::FilterLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        let mut seen = HashSet::new();
        for rule in &file.filters {
            rule.validate()?;
            if !seen.insert(rule.name.clone()) {
                return Err(TelegramError::FilterValidation {
                    name: rule.name.clone(),
                    reason: "duplicate rule name".to_owned(),
                });
            }
        }

        Ok(file.filters)
    }
}
