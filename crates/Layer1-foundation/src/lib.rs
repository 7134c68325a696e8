//! # berth-foundation
//!
//! Foundation layer for Berth:
//! - Error: 공통 에러 타입
//! - Event: 우선순위 훅 버스 (프로세스 / 애플리케이션 범위)
//! - Config: 전역 설정 (BerthConfig)
//! - Storage: JsonStore, 포트 캐시
//! - Metrics: 텔레메트리 / 메시지 출력 포트
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Layer4-cli                                             │
//! │      │                                                  │
//! │  Layer3-proxy ──▶ Layer2-core ◀── Layer2-engine         │
//! │                       │                                 │
//! │                       ▼                                 │
//! │  Layer1-foundation (Error, EventBus, Config, Cache)     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{BerthConfig, ProxyMode, ProxyPorts, BERTH_CONFIG_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{Cache, CacheOptions, FileCache, JsonStore, MemoryCache, USER_DIR_NAME};

// ============================================================================
// Event (훅 버스)
// ============================================================================
pub use event::{app_hooks, process_hooks, EventBus, HookHandler, HookId, HookScope, DEFAULT_PRIORITY};

// ============================================================================
// Metrics (텔레메트리)
// ============================================================================
pub use metrics::{BufferMessenger, LogMetrics, Messenger, Metrics, StderrMessenger};
