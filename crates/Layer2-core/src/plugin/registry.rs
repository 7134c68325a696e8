//! Plugin Registry - 내장 플러그인과 네이티브 확장 관리

use super::descriptor::{AppUnit, PluginDescriptor};
use super::discovery::discover_root;
use super::extension::{AppExtension, ExtensionData};
use crate::app::Application;
use crate::runtime::Runtime;
use berth_foundation::{Error, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 플러그인 레지스트리
///
/// 내장 플러그인 목록(`builtins`)과, 이름으로 참조되는 네이티브 확장을 관리합니다.
pub struct PluginRegistry {
    builtins: RwLock<Vec<PluginDescriptor>>,
    extensions: RwLock<HashMap<String, Arc<dyn AppExtension>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            builtins: RwLock::new(Vec::new()),
            extensions: RwLock::new(HashMap::new()),
        }
    }

    // ========================================================================
    // 등록
    // ========================================================================

    /// 네이티브 확장 등록 (plugin.json의 `app`으로 참조 가능)
    pub fn register_extension(&self, extension: Arc<dyn AppExtension>) -> bool {
        let name = extension.name().to_string();
        let mut extensions = self.extensions.write();
        if extensions.contains_key(&name) {
            debug!("Extension already registered: {}", name);
            return false;
        }
        extensions.insert(name.clone(), extension);
        info!("Registered extension: {}", name);
        true
    }

    /// 내장 플러그인 등록 (확장 등록 + 디스크립터 추가)
    pub fn register_builtin(&self, extension: Arc<dyn AppExtension>) -> bool {
        let name = extension.name().to_string();
        if !self.register_extension(extension) {
            return false;
        }
        self.builtins.write().push(PluginDescriptor::builtin(name));
        true
    }

    pub fn builtins(&self) -> Vec<PluginDescriptor> {
        self.builtins.read().clone()
    }

    pub fn extension(&self, name: &str) -> Option<Arc<dyn AppExtension>> {
        self.extensions.read().get(name).cloned()
    }

    // ========================================================================
    // 발견
    // ========================================================================

    /// 내장 플러그인 + 각 루트에서 발견된 플러그인
    ///
    /// 이름이 같으면 먼저 나온 것이 이깁니다. 루트는 순회 시점에 하나씩 스캔됩니다.
    pub fn find<'a>(&self, roots: &'a [PathBuf]) -> impl Iterator<Item = PluginDescriptor> + 'a {
        let mut seen = HashSet::new();
        self.builtins()
            .into_iter()
            .chain(roots.iter().flat_map(|root| discover_root(root)))
            .filter(move |descriptor| seen.insert(descriptor.name.clone()))
    }

    // ========================================================================
    // 로드
    // ========================================================================

    /// 플러그인의 앱 확장을 실행하고 병합할 데이터를 반환
    ///
    /// 네이티브 확장은 호출 전에 자신이 소유한 훅이 제거됩니다.
    pub async fn load(
        &self,
        descriptor: &PluginDescriptor,
        app: &mut Application,
        runtime: &Arc<Runtime>,
    ) -> Result<ExtensionData> {
        match &descriptor.app {
            None => Ok(ExtensionData::default()),
            Some(AppUnit::Native(name)) => {
                let extension = self
                    .extension(name)
                    .ok_or_else(|| Error::PluginNotFound(name.clone()))?;

                app.events().clear_owner(extension.name());
                debug!(plugin = %descriptor.name, extension = name, "Loading native extension");
                extension.load(app, runtime).await
            }
            Some(AppUnit::File(path)) => {
                debug!(plugin = %descriptor.name, path = %path.display(), "Loading data extension");
                let value = load_data_file(path, runtime)
                    .map_err(|e| Error::Plugin(format!("{}: {}", descriptor.name, e)))?;
                ExtensionData::from_value(value)
                    .map_err(|e| Error::Plugin(format!("{}: {}", descriptor.name, e)))
            }
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn load_data_file(path: &Path, runtime: &Runtime) -> Result<Value> {
    if !path.is_file() {
        return Err(Error::PluginNotFound(path.display().to_string()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        _ => runtime.store().load(path),
    }
}
