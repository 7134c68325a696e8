//! Storage module for Berth
//!
//! - `json`: JSON - 범용 파일 저장/로드
//! - `cache`: 키-값 캐시 (메모리 + 선택적 영속화)

mod cache;
mod json;

// JSON Storage (범용)
pub use json::{JsonStore, USER_DIR_NAME};

// Cache
pub use cache::{Cache, CacheOptions, FileCache, MemoryCache};
