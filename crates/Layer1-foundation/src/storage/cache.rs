//! Key-value cache
//!
//! 프로세스 간에 공유되어야 하는 값(예: 프록시 포트)은 `persist` 옵션으로
//! 파일에 기록됩니다. 잠금은 없으며 마지막 쓰기가 이깁니다.

use super::JsonStore;
use crate::{Error, Result};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// `set` 옵션
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// 디스크에 영속화할지 여부
    pub persist: bool,
}

impl CacheOptions {
    pub fn persist() -> Self {
        Self { persist: true }
    }
}

/// 캐시 trait
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value, opts: CacheOptions) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

impl dyn Cache {
    /// 타입 지정 조회. 역직렬화에 실패하면 없는 값으로 취급합니다.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, "Ignoring malformed cache entry: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// MemoryCache
// ============================================================================

/// 메모리 전용 캐시 (persist 무시)
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: Value) -> Self {
        self.entries.write().insert(key.to_string(), value);
        self
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value, _opts: CacheOptions) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// FileCache
// ============================================================================

/// 메모리 캐시 + JsonStore 영속화
///
/// `get`은 메모리에 없으면 디스크에서 읽어 메모리에 올립니다.
#[derive(Debug)]
pub struct FileCache {
    memory: RwLock<HashMap<String, Value>>,
    store: JsonStore,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            store: JsonStore::new(dir),
        }
    }

    pub fn dir(&self) -> &std::path::Path {
        self.store.base_dir()
    }

    fn filename(key: &str) -> String {
        let safe: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        format!("{}.json", safe)
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        if let Some(v) = self.memory.read().get(key) {
            return Some(v.clone());
        }

        match self.store.load_optional::<Value>(&Self::filename(key)) {
            Ok(Some(v)) => {
                debug!(key, "Loaded cache entry from disk");
                self.memory.write().insert(key.to_string(), v.clone());
                Some(v)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, "Failed to read cache entry: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value, opts: CacheOptions) -> Result<()> {
        if opts.persist {
            self.store
                .save(&Self::filename(key), &value)
                .map_err(|e| Error::Cache(format!("{}: {}", key, e)))?;
        }
        self.memory.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.memory.write().remove(key);
        self.store
            .remove(&Self::filename(key))
            .map_err(|e| Error::Cache(format!("{}: {}", key, e)))
    }
}
