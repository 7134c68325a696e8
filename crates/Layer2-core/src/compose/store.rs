//! Descriptor store - 서비스 트리 파일 읽기/쓰기

use berth_foundation::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 디스크립터 저장소
///
/// 같은 트리와 경로에 대해 `dump`는 바이트 단위로 같은 파일을 만들어야 합니다.
pub trait DescriptorStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<Value>;

    fn dump(&self, path: &Path, data: &Value) -> Result<PathBuf>;
}

/// YAML 디스크립터 저장소
#[derive(Debug, Clone, Default)]
pub struct YamlStore;

impl YamlStore {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorStore for YamlStore {
    fn load(&self, path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::descriptor(path, format!("read failed: {}", e)))?;
        let value: Value = serde_yaml::from_str(&content)
            .map_err(|e| Error::descriptor(path, format!("parse failed: {}", e)))?;

        // 빈 파일은 빈 트리
        Ok(match value {
            Value::Null => Value::Object(Default::default()),
            other => other,
        })
    }

    fn dump(&self, path: &Path, data: &Value) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::descriptor(parent, format!("mkdir failed: {}", e)))?;
        }
        let content = serde_yaml::to_string(data)?;
        std::fs::write(path, content)
            .map_err(|e| Error::descriptor(path, format!("write failed: {}", e)))?;

        debug!(path = %path.display(), "Dumped descriptor");
        Ok(path.to_path_buf())
    }
}

/// 선언된 레이어 경로를 앱 루트 기준으로 풀고, 존재하지 않는 파일은 제외
pub fn validate_files(files: &[String], root: &Path) -> Vec<PathBuf> {
    files
        .iter()
        .filter_map(|file| {
            let path = Path::new(file);
            let resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            };

            if resolved.is_file() {
                Some(resolved)
            } else {
                warn!(file = %resolved.display(), "Skipping missing compose layer");
                None
            }
        })
        .collect()
}
