//! Plugin descriptor - 발견된 플러그인 정보

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 플러그인 매니페스트 파일명
pub const PLUGIN_MANIFEST: &str = "plugin.json";

/// 애플리케이션 확장 유닛
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppUnit {
    /// 레지스트리에 등록된 네이티브 확장 이름
    Native(String),
    /// 확장 결과를 담은 데이터 파일 (yml / yaml / json)
    File(PathBuf),
}

impl AppUnit {
    /// 매니페스트의 `app` 값 해석
    ///
    /// 데이터 파일 확장자를 가지면 플러그인 디렉토리 기준 파일, 아니면 네이티브 확장 이름.
    pub fn parse(value: &str, plugin_dir: &Path) -> Self {
        let is_data_file = Path::new(value)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e, "yml" | "yaml" | "json"))
            .unwrap_or(false);

        if is_data_file {
            AppUnit::File(plugin_dir.join(value))
        } else {
            AppUnit::Native(value.to_string())
        }
    }
}

/// 플러그인 디스크립터
///
/// `app`이 없으면 애플리케이션 확장이 없는 플러그인이며, 앱 로딩에서 제외됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub app: Option<AppUnit>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            app: None,
        }
    }

    /// 내장 네이티브 확장
    pub fn builtin(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            app: Some(AppUnit::Native(name.clone())),
            name,
            path: PathBuf::new(),
        }
    }

    pub fn with_app(mut self, app: AppUnit) -> Self {
        self.app = Some(app);
        self
    }

    pub fn has_app(&self) -> bool {
        self.app.is_some()
    }
}

/// plugin.json 형식
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct PluginManifestFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub app: Option<String>,
}
