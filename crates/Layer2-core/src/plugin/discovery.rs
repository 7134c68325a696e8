//! Plugin Discovery - 파일 시스템에서 플러그인 발견
//!
//! `<root>/plugins/<dir>/plugin.json` 구조를 찾습니다.

use super::descriptor::{AppUnit, PluginDescriptor, PluginManifestFile, PLUGIN_MANIFEST};
use berth_foundation::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 플러그인 디렉토리 이름
pub const PLUGINS_DIR: &str = "plugins";

/// 하나의 루트에서 플러그인 발견 (디렉토리 이름 순)
pub fn discover_root(root: &Path) -> Vec<PluginDescriptor> {
    let dir = root.join(PLUGINS_DIR);
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut entries: Vec<PathBuf> = match std::fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(e) => {
            warn!("Failed to scan plugin directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };
    entries.sort();

    entries
        .into_iter()
        .filter_map(|path| {
            let manifest_path = path.join(PLUGIN_MANIFEST);
            if !manifest_path.exists() {
                return None;
            }
            match parse_manifest(&manifest_path, &path) {
                Ok(descriptor) => {
                    debug!("Found plugin: {} at {:?}", descriptor.name, path);
                    Some(descriptor)
                }
                Err(e) => {
                    warn!("Failed to parse plugin manifest {:?}: {}", manifest_path, e);
                    None
                }
            }
        })
        .collect()
}

/// plugin.json 파싱. 이름이 없으면 디렉토리 이름을 사용합니다.
fn parse_manifest(manifest_path: &Path, plugin_dir: &Path) -> Result<PluginDescriptor> {
    let content = std::fs::read_to_string(manifest_path)?;
    let manifest: PluginManifestFile = serde_json::from_str(&content)?;

    let name = manifest.name.unwrap_or_else(|| {
        plugin_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let mut descriptor = PluginDescriptor::new(name, plugin_dir);
    if let Some(app) = manifest.app {
        descriptor = descriptor.with_app(AppUnit::parse(&app, plugin_dir));
    }
    Ok(descriptor)
}
