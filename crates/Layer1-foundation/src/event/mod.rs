//! Event System - 라이프사이클 훅 버스
//!
//! 이름이 붙은 훅에 우선순위 핸들러를 등록하고 순차적으로 실행합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  EventBus<C>  (process / app)               │
//! │                                                             │
//! │  emit("pre-start", &mut ctx)                                │
//! │      │                                                      │
//! │      ▼                                                      │
//! │  priority 1 ──▶ priority 3 ──▶ priority 5 ──▶ priority 5    │
//! │  (proxy)        ...            (first)        (second)      │
//! │                                                             │
//! │  실패 시 즉시 중단, 에러는 호출자에게 전달                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! 프로세스 범위 버스와 애플리케이션 범위 버스는 별도 인스턴스이며 명시적으로
//! 전달됩니다.

pub mod bus;
pub mod types;

// Re-exports
pub use bus::{EventBus, HookHandler, HookId, HookScope, DEFAULT_PRIORITY};
pub use types::{app as app_hooks, process as process_hooks};
