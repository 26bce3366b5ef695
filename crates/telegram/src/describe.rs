//! 설명 조회 -- 코드에서 사람이 읽는 텍스트로의 enrichment
//!
//! 프로토콜별 YAML 맵 파일(`코드: 설명`)을 시작 시 로드합니다.
//! 조회 실패는 파이프라인을 멈추지 않습니다 — 코드가 그대로
//! 반환됩니다. FMS 방향 문구는 테이블과 무관하게 방향 비트에서
//! 파생됩니다([`FmsDirection::text`](funkwache_core::event::FmsDirection::text)).

use std::collections::HashMap;
use std::path::Path;

use funkwache_core::event::Protocol;

use crate::error::TelegramError;

/// 테이블 파일 최대 크기
const MAX_TABLE_FILE_SIZE: u64 = 4 * 1024 * 1024; // 4MB

/// (프로토콜, 코드) -> 설명 정적 테이블
pub struct DescriptionTable {
    entries: HashMap<(Protocol, String), String>,
}

impl DescriptionTable {
    /// 빈 테이블을 생성합니다 — 모든 조회가 코드를 그대로 돌려줍니다.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 프로토콜 하나의 YAML 맵 파일을 테이블에 로드합니다.
    ///
    /// 로드된 항목 수를 반환합니다. 파일/YAML 결함은 시작 시점의
    /// 설정 에러로 치명적입니다.
    pub async fn load_protocol_file(
        &mut self,
        protocol: Protocol,
        path: impl AsRef<Path>,
    ) -> Result<usize, TelegramError> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| TelegramError::DescriptionLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_TABLE_FILE_SIZE {
            return Err(TelegramError::DescriptionLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_TABLE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TelegramError::DescriptionLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file: {e}"),
            }
        })?;

        let count = self.parse_yaml(protocol, &content, &path.display().to_string())?;

        tracing::info!(
            %protocol,
            path = %path.display(),
            count,
            "loaded description table"
        );

        Ok(count)
    }

    /// YAML 맵 문자열을 테이블에 병합합니다.
    ///
    /// 코드 키는 따옴표 없이 쓰면 YAML이 숫자로 읽으므로, 스칼라 키를
    /// 문자열로 정규화하여 받습니다.
    pub fn parse_yaml(
        &mut self,
        protocol: Protocol,
        yaml_str: &str,
        source: &str,
    ) -> Result<usize, TelegramError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml_str).map_err(|e| TelegramError::DescriptionLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        let mapping = match value {
            serde_yaml::Value::Mapping(mapping) => mapping,
            serde_yaml::Value::Null => return Ok(0),
            _ => {
                return Err(TelegramError::DescriptionLoad {
                    path: source.to_owned(),
                    reason: "expected a top-level mapping of code: description".to_owned(),
                });
            }
        };

        let mut count = 0;
        for (key, entry) in mapping {
            let code = match key {
                serde_yaml::Value::String(code) => code,
                serde_yaml::Value::Number(number) => number.to_string(),
                other => {
                    return Err(TelegramError::DescriptionLoad {
                        path: source.to_owned(),
                        reason: format!("unsupported code key: {other:?}"),
                    });
                }
            };
            let text = match entry {
                serde_yaml::Value::String(text) => text,
                other => {
                    return Err(TelegramError::DescriptionLoad {
                        path: source.to_owned(),
                        reason: format!("description for '{code}' is not a string: {other:?}"),
                    });
                }
            };
            self.entries.insert((protocol, code), text);
            count += 1;
        }

        Ok(count)
    }

    /// 코드의 설명을 조회합니다.
    ///
    /// 미등록 코드는 그대로 반환됩니다 — 조회 실패는 비치명입니다.
    pub fn describe(&self, protocol: Protocol, code: &str) -> String {
        match self.entries.get(&(protocol, code.to_owned())) {
            Some(text) => text.clone(),
            None => {
                tracing::debug!(%protocol, code, "description lookup miss");
                code.to_owned()
            }
        }
    }

    /// 등록된 항목 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 테이블이 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DescriptionTable {
    fn default() -> Self {
        Self::new()
    }
}
