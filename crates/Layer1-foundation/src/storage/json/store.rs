//! JSON 파일 저장소

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// 사용자 설정 디렉토리 이름 (~/.berth)
pub const USER_DIR_NAME: &str = ".berth";

/// JSON 파일 저장소
///
/// 디렉토리 하나에 `<name>.json` 파일들을 저장합니다.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 글로벌 설정 (~/.berth/)
    pub fn global() -> Result<Self> {
        let dir = dirs::home_dir()
            .ok_or_else(|| Error::Config("Cannot find home directory".to_string()))?
            .join(USER_DIR_NAME);
        Ok(Self::new(dir))
    }

    /// 프로젝트 설정 (<root>/.berth/)
    pub fn project(root: impl Into<PathBuf>) -> Self {
        Self::new(root.into().join(USER_DIR_NAME))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            std::fs::create_dir_all(&self.base_dir).map_err(|e| {
                Error::Storage(format!(
                    "Failed to create {}: {}",
                    self.base_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// JSON 로드
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.file_path(filename);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// JSON 로드 (Optional)
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        if !self.exists(filename) {
            return Ok(None);
        }
        self.load(filename).map(Some)
    }

    /// JSON 저장
    pub fn save<T: Serialize>(&self, filename: &str, data: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.file_path(filename);
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// 파일 존재 여부
    pub fn exists(&self, filename: &str) -> bool {
        self.file_path(filename).exists()
    }

    /// 파일 삭제 (없으면 무시)
    pub fn remove(&self, filename: &str) -> Result<()> {
        let path = self.file_path(filename);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                Error::Storage(format!("Failed to remove {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));

        assert!(store.load_optional::<serde_json::Value>("ports.json").unwrap().is_none());

        store.save("ports.json", &json!({"http": 80})).unwrap();
        let value: serde_json::Value = store.load("ports.json").unwrap();
        assert_eq!(value["http"], 80);

        store.remove("ports.json").unwrap();
        assert!(!store.exists("ports.json"));
        store.remove("ports.json").unwrap();
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = JsonStore::new(dir.path());

        let err = store.load::<serde_json::Value>("bad.json").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
