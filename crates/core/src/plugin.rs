//! 플러그인 시스템 — 출력 채널의 등록과 생명주기 관리
//!
//! 모든 출력 채널(콘솔, 아카이브 파일 등)은 [`AlarmPlugin`] trait을
//! 구현하는 값으로 표현됩니다. 런타임 코드 로딩은 없으며, 레지스트리는
//! 시작 시 설정에서 한 번 조립됩니다.
//!
//! [`PluginRegistry`]는 등록 순서를 보존합니다. 디스패처는 이 순서대로
//! 필터를 평가하고 전달을 수행합니다.
//!
//! # 생명주기
//! ```text
//! register() → init_all() → into_shared() → deliver() ... → stop()
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FunkwacheError, PluginError};
use crate::event::AlarmEvent;

/// dyn-compatible trait들이 반환하는 박싱된 future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ─── PluginKind ──────────────────────────────────────────────────────

/// 플러그인 유형
///
/// 기본 제공 출력 유형과 사용자 정의 유형을 구분합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginKind {
    /// 로그 출력 (tracing)
    Console,
    /// JSON-lines 아카이브 파일
    Archive,
    /// 사용자 정의 플러그인
    Custom(String),
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Archive => write!(f, "archive"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

// ─── PluginInfo ──────────────────────────────────────────────────────

/// 플러그인 메타데이터
///
/// `name`은 필터 규칙의 대상 지정과 실패 로깅 양쪽에 쓰이는 안정된
/// 식별자입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// 플러그인 고유 이름 (예: `"console"`)
    pub name: String,
    /// 플러그인 버전 (semver)
    pub version: String,
    /// 플러그인 설명
    pub description: String,
    /// 플러그인 유형
    pub kind: PluginKind,
}

// ─── AlarmPlugin Trait ───────────────────────────────────────────────

/// 모든 출력 채널이 구현하는 플러그인 trait
///
/// `deliver`는 공유 참조를 받으므로 디스패처가 전달을 플러그인별
/// 태스크로 띄울 수 있습니다. 내부 상태가 필요한 플러그인은 내부
/// 가변성을 사용합니다.
pub trait AlarmPlugin: Send + Sync {
    /// 플러그인 메타데이터를 반환합니다.
    fn info(&self) -> &PluginInfo;

    /// 플러그인을 초기화합니다 (리소스 확보, 설정 검증).
    ///
    /// 레지스트리가 공유 핸들로 변환되기 전에 한 번 호출됩니다.
    fn init(&mut self) -> impl Future<Output = Result<(), FunkwacheError>> + Send;

    /// 알람 이벤트 하나를 전달합니다.
    ///
    /// 실패는 이 플러그인에만 국한됩니다. 재시도 정책은 플러그인
    /// 자신의 몫입니다.
    fn deliver(&self, event: &AlarmEvent) -> impl Future<Output = Result<(), FunkwacheError>> + Send;

    /// 플러그인을 정지합니다 (버퍼 플러시, 연결 종료).
    fn stop(&self) -> impl Future<Output = Result<(), FunkwacheError>> + Send;
}

// ─── DynAlarmPlugin Trait ────────────────────────────────────────────

/// dyn-compatible 플러그인 trait
///
/// `AlarmPlugin`은 RPITIT를 사용하므로 `dyn AlarmPlugin`이 불가합니다.
/// `DynAlarmPlugin`은 `BoxFuture`를 반환하여 레지스트리와 디스패처가
/// 플러그인을 동적으로 다룰 수 있게 합니다.
pub trait DynAlarmPlugin: Send + Sync {
    /// 플러그인 메타데이터를 반환합니다.
    fn info(&self) -> &PluginInfo;

    /// 플러그인을 초기화합니다.
    fn init(&mut self) -> BoxFuture<'_, Result<(), FunkwacheError>>;

    /// 알람 이벤트 하나를 전달합니다.
    fn deliver<'a>(&'a self, event: &'a AlarmEvent) -> BoxFuture<'a, Result<(), FunkwacheError>>;

    /// 플러그인을 정지합니다.
    fn stop(&self) -> BoxFuture<'_, Result<(), FunkwacheError>>;
}

/// AlarmPlugin을 구현한 타입은 자동으로 DynAlarmPlugin도 구현됩니다.
impl<T: AlarmPlugin> DynAlarmPlugin for T {
    fn info(&self) -> &PluginInfo {
        AlarmPlugin::info(self)
    }

    fn init(&mut self) -> BoxFuture<'_, Result<(), FunkwacheError>> {
        Box::pin(AlarmPlugin::init(self))
    }

    fn deliver<'a>(&'a self, event: &'a AlarmEvent) -> BoxFuture<'a, Result<(), FunkwacheError>> {
        Box::pin(AlarmPlugin::deliver(self, event))
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), FunkwacheError>> {
        Box::pin(AlarmPlugin::stop(self))
    }
}

// ─── PluginRegistry ──────────────────────────────────────────────────

/// 플러그인 레지스트리
///
/// 등록, 초기화, 정지를 담당하며 등록 순서가 보존됩니다.
/// 초기화가 끝나면 [`into_shared`](Self::into_shared)로 디스패처에
/// 넘길 공유 핸들 목록을 얻습니다.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn DynAlarmPlugin>>,
}

impl PluginRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// 플러그인을 등록합니다.
    ///
    /// 동일한 이름의 플러그인이 이미 등록되어 있으면 에러를 반환합니다.
    pub fn register(&mut self, plugin: Box<dyn DynAlarmPlugin>) -> Result<(), FunkwacheError> {
        let name = plugin.info().name.clone();
        if self.plugins.iter().any(|p| p.info().name == name) {
            return Err(PluginError::AlreadyRegistered { name }.into());
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// 이름으로 플러그인을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&dyn DynAlarmPlugin> {
        self.plugins
            .iter()
            .find(|p| p.info().name == name)
            .map(|p| p.as_ref())
    }

    /// 모든 플러그인을 등록 순서대로 초기화합니다.
    ///
    /// 첫 번째 실패 시 즉시 반환합니다 (fail-fast). 설정이 깨진
    /// 플러그인은 시작 시점에 드러나야 합니다.
    pub async fn init_all(&mut self) -> Result<(), FunkwacheError> {
        for plugin in &mut self.plugins {
            let name = plugin.info().name.clone();
            plugin.init().await.map_err(|e| {
                FunkwacheError::from(PluginError::InitFailed {
                    name,
                    reason: e.to_string(),
                })
            })?;
        }
        Ok(())
    }

    /// 모든 플러그인을 등록 순서대로 정지합니다.
    ///
    /// 개별 플러그인 정지 실패 시에도 나머지 플러그인의 정지를 계속하고,
    /// 모든 에러를 수집하여 반환합니다.
    pub async fn stop_all(&self) -> Result<(), FunkwacheError> {
        let mut errors = Vec::new();
        for plugin in &self.plugins {
            if let Err(e) = plugin.stop().await {
                errors.push(format!("{}: {}", plugin.info().name, e));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PluginError::StopFailed(errors.join("; ")).into())
        }
    }

    /// 등록된 플러그인 수를 반환합니다.
    pub fn count(&self) -> usize {
        self.plugins.len()
    }

    /// 등록된 모든 플러그인의 정보를 등록 순서대로 반환합니다.
    pub fn list(&self) -> Vec<&PluginInfo> {
        self.plugins.iter().map(|p| p.info()).collect()
    }

    /// 레지스트리를 디스패처용 공유 핸들 목록으로 변환합니다.
    ///
    /// 등록 순서가 보존됩니다. 이후에는 `deliver`/`stop`만 호출 가능하며
    /// 재초기화는 불가합니다.
    pub fn into_shared(self) -> Vec<Arc<dyn DynAlarmPlugin>> {
        self.plugins.into_iter().map(Arc::from).collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field(
                "plugins",
                &self.plugins.iter().map(|p| &p.info().name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
