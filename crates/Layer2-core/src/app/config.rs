//! App config - 애플리케이션 디스크립터 (.berth.yml)

use crate::compose::deep_merge;
use berth_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 애플리케이션 디스크립터 파일명
pub const APP_DESCRIPTOR_FILE: &str = ".berth.yml";

/// 애플리케이션 설정
///
/// 알 수 없는 키는 `extra`에 그대로 보존되어 플러그인이 읽을 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,

    /// 앱 루트 기준 compose 레이어 파일
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compose: Vec<String>,

    /// 서비스 이름 → 프록시 URL 목록
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub proxy: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 디스크립터 파일 로드
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::descriptor(path, format!("read failed: {}", e)))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::descriptor(path, format!("parse failed: {}", e)))?;

        if config.name.trim().is_empty() {
            return Err(Error::descriptor(path, "missing app name"));
        }
        Ok(config)
    }

    /// `start`부터 상위 디렉토리로 올라가며 디스크립터 파일 탐색
    pub fn locate(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(APP_DESCRIPTOR_FILE))
            .find(|candidate| candidate.is_file())
    }

    pub fn with_compose(mut self, file: impl Into<String>) -> Self {
        self.compose.push(file.into());
        self
    }

    pub fn with_proxy_route(mut self, service: impl Into<String>, urls: Vec<String>) -> Self {
        self.proxy.insert(service.into(), urls);
        self
    }

    pub fn with_recipe(mut self, recipe: impl Into<String>) -> Self {
        self.recipe = Some(recipe.into());
        self
    }

    /// 부분 설정을 deep merge
    pub fn merge_value(&mut self, overlay: Value) -> Result<()> {
        let mut current = serde_json::to_value(&*self)?;
        deep_merge(&mut current, overlay);
        *self = serde_json::from_value(current)?;
        Ok(())
    }
}
