//! Event Bus - 우선순위 기반 훅 실행 시스템
//!
//! 이름이 붙은 라이프사이클 훅에 핸들러를 등록하고, `emit` 시
//! 우선순위 오름차순(동일 우선순위는 등록 순서)으로 하나씩 실행합니다.
//! 핸들러 k+1은 핸들러 k가 완료된 뒤에만 시작되며, 실패하면 즉시 중단합니다.

use crate::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// 우선순위를 지정하지 않은 핸들러의 기본값
pub const DEFAULT_PRIORITY: i32 = 5;

// ============================================================================
// HookId
// ============================================================================

/// 등록된 훅 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

impl std::fmt::Display for HookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hook-{}", self.0)
    }
}

/// 버스 범위 (로깅용)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookScope {
    /// 프로세스 전체 (앱 인스턴스화 등 전역 액션)
    Process,
    /// 단일 애플리케이션
    Application,
}

impl std::fmt::Display for HookScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Process => write!(f, "process"),
            Self::Application => write!(f, "app"),
        }
    }
}

// ============================================================================
// HookHandler Trait
// ============================================================================

/// 훅 핸들러 trait
///
/// `C`는 emit 시 전달되는 컨텍스트 (보통 애플리케이션)입니다.
#[async_trait]
pub trait HookHandler<C: Send>: Send + Sync {
    /// 핸들러 이름 (디버깅용)
    fn name(&self) -> &str {
        "anonymous"
    }

    /// 훅 처리
    async fn handle(&self, ctx: &mut C) -> Result<()>;
}

/// 클로저 기반 핸들러
struct FnHook<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<C, F> HookHandler<C> for FnHook<F>
where
    C: Send,
    F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &mut C) -> Result<()> {
        (self.f)(ctx).await
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 등록된 핸들러 정보
struct Registration<C> {
    id: HookId,
    priority: i32,
    owner: Option<String>,
    handler: Arc<dyn HookHandler<C>>,
}

/// 훅 버스
///
/// 프로세스 전체용과 애플리케이션별 인스턴스가 따로 존재하며, 같은 정렬 규칙을
/// 공유하지만 핸들러 목록은 공유하지 않습니다.
///
/// ```ignore
/// let bus: EventBus<App> = EventBus::new(HookScope::Application);
/// bus.on("pre-start", 1, |app: &mut App| Box::pin(async move {
///     app.ready = true;
///     Ok(())
/// }));
/// bus.emit("pre-start", &mut app).await?;
/// ```
pub struct EventBus<C> {
    scope: HookScope,
    hooks: RwLock<HashMap<String, Vec<Registration<C>>>>,
    counter: AtomicU64,
}

impl<C: Send> EventBus<C> {
    pub fn new(scope: HookScope) -> Self {
        Self {
            scope,
            hooks: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn scope(&self) -> HookScope {
        self.scope
    }

    /// 클로저 핸들러 등록. `priority`가 None이면 [`DEFAULT_PRIORITY`]
    pub fn on<F>(&self, name: &str, priority: impl Into<Option<i32>>, f: F) -> HookId
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
        C: 'static,
    {
        let handler = Arc::new(FnHook {
            name: name.to_string(),
            f,
        });
        self.register(name, priority.into(), None, handler)
    }

    /// 소유자 태그와 함께 클로저 핸들러 등록 (플러그인 재로드 시 일괄 제거용)
    pub fn on_owned<F>(
        &self,
        owner: &str,
        name: &str,
        priority: impl Into<Option<i32>>,
        f: F,
    ) -> HookId
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
        C: 'static,
    {
        let handler = Arc::new(FnHook {
            name: format!("{}:{}", owner, name),
            f,
        });
        self.register(name, priority.into(), Some(owner.to_string()), handler)
    }

    /// trait 객체 핸들러 등록. 등록은 실패하지 않습니다.
    pub fn register(
        &self,
        name: &str,
        priority: Option<i32>,
        owner: Option<String>,
        handler: Arc<dyn HookHandler<C>>,
    ) -> HookId {
        let id = HookId(self.counter.fetch_add(1, Ordering::SeqCst));
        let priority = priority.unwrap_or(DEFAULT_PRIORITY);

        debug!(
            scope = %self.scope,
            hook = name,
            handler = handler.name(),
            priority,
            hook_id = %id,
            "Registering hook handler"
        );

        let mut hooks = self.hooks.write();
        let list = hooks.entry(name.to_string()).or_default();
        // 같은 우선순위 안에서는 먼저 등록된 핸들러가 앞에 옵니다
        let pos = list.partition_point(|r| r.priority <= priority);
        list.insert(
            pos,
            Registration {
                id,
                priority,
                owner,
                handler,
            },
        );

        id
    }

    /// 핸들러 해제
    pub fn off(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write();
        for list in hooks.values_mut() {
            if let Some(pos) = list.iter().position(|r| r.id == id) {
                list.remove(pos);
                debug!(scope = %self.scope, hook_id = %id, "Unregistered hook handler");
                return true;
            }
        }
        false
    }

    /// 특정 소유자가 등록한 핸들러 전부 해제
    pub fn clear_owner(&self, owner: &str) -> usize {
        let mut hooks = self.hooks.write();
        let mut removed = 0;
        for list in hooks.values_mut() {
            let before = list.len();
            list.retain(|r| r.owner.as_deref() != Some(owner));
            removed += before - list.len();
        }
        if removed > 0 {
            debug!(scope = %self.scope, owner, removed, "Cleared owned hook handlers");
        }
        removed
    }

    /// 훅 실행
    ///
    /// 핸들러 목록은 실행 전에 스냅샷으로 복사되므로, 핸들러 안에서 같은 버스에
    /// 새 핸들러를 등록해도 현재 emit에는 영향이 없습니다.
    pub async fn emit(&self, name: &str, ctx: &mut C) -> Result<()> {
        let handlers: Vec<(HookId, Arc<dyn HookHandler<C>>)> = {
            let hooks = self.hooks.read();
            hooks
                .get(name)
                .map(|list| {
                    list.iter()
                        .map(|r| (r.id, Arc::clone(&r.handler)))
                        .collect()
                })
                .unwrap_or_default()
        };

        trace!(scope = %self.scope, hook = name, handlers = handlers.len(), "Emitting hook");

        for (id, handler) in handlers {
            trace!(hook = name, hook_id = %id, handler = handler.name(), "Running hook handler");
            if let Err(e) = handler.handle(ctx).await {
                error!(
                    scope = %self.scope,
                    hook = name,
                    handler = handler.name(),
                    "Hook handler failed: {}",
                    e
                );
                return Err(e);
            }
        }

        Ok(())
    }

    /// 특정 훅에 등록된 핸들러 수
    pub fn handler_count(&self, name: &str) -> usize {
        self.hooks.read().get(name).map(Vec::len).unwrap_or(0)
    }

    /// 핸들러가 하나 이상 등록된 훅 이름 (정렬됨)
    pub fn hook_names(&self) -> Vec<String> {
        let hooks = self.hooks.read();
        let mut names: Vec<String> = hooks
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

// ============================================================================
// 테스트
// ============================================================================
