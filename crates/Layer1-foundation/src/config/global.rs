//! Berth Config - 전역 설정
//!
//! 프로세스 전체에서 공유되는 설정. 애플리케이션 코어는 읽기만 합니다.

use crate::storage::{JsonStore, USER_DIR_NAME};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 설정 파일명
pub const BERTH_CONFIG_FILE: &str = "config.json";

// ============================================================================
// ProxyPorts
// ============================================================================

/// 프록시 포트 상태. `None`은 해당 프로토콜의 (재)스캔이 필요함을 의미합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyPorts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<u16>,
}

impl ProxyPorts {
    pub fn new(http: u16, https: u16) -> Self {
        Self {
            http: Some(http),
            https: Some(https),
        }
    }

    /// 두 프로토콜 모두 확정되었는지
    pub fn is_resolved(&self) -> bool {
        self.http.is_some() && self.https.is_some()
    }
}

// ============================================================================
// Proxy Mode
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyMode {
    #[default]
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

// ============================================================================
// BerthConfig
// ============================================================================

/// Berth 전역 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BerthConfig {
    /// 사용자 설정 루트 (~/.berth)
    pub user_conf_root: PathBuf,

    /// 모든 서비스에 주입되는 환경 변수
    pub app_env: BTreeMap<String, String>,

    /// 모든 서비스에 주입되는 라벨
    pub app_labels: BTreeMap<String, String>,

    // ========================================================================
    // Proxy
    // ========================================================================
    pub proxy: ProxyMode,
    pub proxy_name: String,
    pub proxy_container: String,
    pub proxy_net: String,
    pub proxy_cache: String,
    pub proxy_domain: String,
    pub proxy_image: String,
    pub proxy_http_port: u16,
    pub proxy_https_port: u16,
    pub proxy_http_fallbacks: Vec<u16>,
    pub proxy_https_fallbacks: Vec<u16>,

    // ========================================================================
    // Scanning
    // ========================================================================
    /// URL 생존 확인 동시 요청 상한
    pub scan_concurrency: usize,
    /// URL 요청 타임아웃 (ms)
    pub scan_timeout_ms: u64,
}

impl Default for BerthConfig {
    fn default() -> Self {
        let user_conf_root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(USER_DIR_NAME);

        Self {
            user_conf_root,
            app_env: BTreeMap::new(),
            app_labels: BTreeMap::new(),
            proxy: ProxyMode::On,
            proxy_name: "berthproxy".to_string(),
            proxy_container: "berthproxy_proxy_1".to_string(),
            proxy_net: "berthproxy_edge".to_string(),
            proxy_cache: "proxy.ports".to_string(),
            proxy_domain: "berth.site".to_string(),
            proxy_image: "traefik:1.7".to_string(),
            proxy_http_port: 80,
            proxy_https_port: 443,
            proxy_http_fallbacks: vec![8000, 8080, 8888, 8008],
            proxy_https_fallbacks: vec![444, 8443, 4343, 4444],
            scan_concurrency: 16,
            scan_timeout_ms: 3000,
        }
    }
}

impl BerthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 설정 루트 지정
    pub fn with_user_conf_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.user_conf_root = root.into();
        self
    }

    pub fn with_proxy(mut self, mode: ProxyMode) -> Self {
        self.proxy = mode;
        self
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 (~/.berth) + 프로젝트 (<root>/.berth) 병합 로드
    pub fn load(project_root: &Path) -> Result<Self> {
        let mut stores = Vec::new();
        if let Ok(global) = JsonStore::global() {
            stores.push(global);
        }
        stores.push(JsonStore::project(project_root));
        Self::load_from(&stores)
    }

    /// 주어진 저장소들을 순서대로 병합 (뒤의 파일이 우선)
    pub fn load_from(stores: &[JsonStore]) -> Result<Self> {
        let mut merged = serde_json::Map::new();

        for store in stores {
            if let Some(Value::Object(layer)) = store.load_optional::<Value>(BERTH_CONFIG_FILE)? {
                debug!(path = %store.file_path(BERTH_CONFIG_FILE).display(), "Loaded config layer");
                merged.extend(layer);
            }
        }

        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    // ========================================================================
    // 파생 값
    // ========================================================================

    pub fn proxy_enabled(&self) -> bool {
        self.proxy == ProxyMode::On
    }

    /// 원하는 프록시 포트
    pub fn proxy_current_ports(&self) -> ProxyPorts {
        ProxyPorts::new(self.proxy_http_port, self.proxy_https_port)
    }

    /// HTTP 스캔 후보 (선호 포트 + 대체 포트)
    pub fn proxy_scan_http(&self) -> Vec<u16> {
        std::iter::once(self.proxy_http_port)
            .chain(self.proxy_http_fallbacks.iter().copied())
            .collect()
    }

    /// HTTPS 스캔 후보
    pub fn proxy_scan_https(&self) -> Vec<u16> {
        std::iter::once(self.proxy_https_port)
            .chain(self.proxy_https_fallbacks.iter().copied())
            .collect()
    }

    /// 애플리케이션 compose 파일 루트
    pub fn compose_root(&self) -> PathBuf {
        self.user_conf_root.join("compose")
    }

    /// 프록시 유닛 compose 디렉토리
    pub fn proxy_dir(&self) -> PathBuf {
        self.user_conf_root.join("proxy")
    }

    /// 영속 캐시 디렉토리
    pub fn cache_dir(&self) -> PathBuf {
        self.user_conf_root.join("cache")
    }
}
