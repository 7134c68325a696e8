//! Runtime - 프로세스 전체 협력자 묶음
//!
//! 모든 애플리케이션과 확장에 같은 인스턴스가 전달됩니다.

use crate::app::Application;
use crate::compose::{DescriptorStore, YamlStore};
use crate::engine::Engine;
use crate::plugin::{AppExtension, PluginRegistry};
use crate::scan::{HttpUrlScanner, PortScanner, TcpPortScanner, UrlScanner};
use berth_foundation::{
    BerthConfig, Cache, Error, EventBus, FileCache, HookScope, LogMetrics, Messenger, Metrics,
    Result, StderrMessenger,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 런타임 컨텍스트
pub struct Runtime {
    config: BerthConfig,
    events: Arc<EventBus<Application>>,
    plugins: PluginRegistry,
    plugin_roots: Vec<PathBuf>,
    engine: Arc<dyn Engine>,
    cache: Arc<dyn Cache>,
    metrics: Arc<dyn Metrics>,
    messenger: Arc<dyn Messenger>,
    store: Arc<dyn DescriptorStore>,
    url_scanner: Arc<dyn UrlScanner>,
    port_scanner: Arc<dyn PortScanner>,
}

impl Runtime {
    pub fn builder(config: BerthConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    pub fn config(&self) -> &BerthConfig {
        &self.config
    }

    /// 프로세스 범위 훅 버스
    pub fn events(&self) -> &Arc<EventBus<Application>> {
        &self.events
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// 전역 플러그인 검색 루트
    pub fn plugin_roots(&self) -> &[PathBuf] {
        &self.plugin_roots
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<dyn Metrics> {
        &self.metrics
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    pub fn store(&self) -> &dyn DescriptorStore {
        self.store.as_ref()
    }

    pub fn url_scanner(&self) -> &Arc<dyn UrlScanner> {
        &self.url_scanner
    }

    pub fn port_scanner(&self) -> &Arc<dyn PortScanner> {
        &self.port_scanner
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Runtime 빌더
///
/// 엔진은 필수이며, 나머지는 설정에서 파생된 기본 구현을 사용합니다.
pub struct RuntimeBuilder {
    config: BerthConfig,
    plugins: PluginRegistry,
    plugin_roots: Option<Vec<PathBuf>>,
    engine: Option<Arc<dyn Engine>>,
    cache: Option<Arc<dyn Cache>>,
    metrics: Option<Arc<dyn Metrics>>,
    messenger: Option<Arc<dyn Messenger>>,
    store: Option<Arc<dyn DescriptorStore>>,
    url_scanner: Option<Arc<dyn UrlScanner>>,
    port_scanner: Option<Arc<dyn PortScanner>>,
}

impl RuntimeBuilder {
    pub fn new(config: BerthConfig) -> Self {
        Self {
            config,
            plugins: PluginRegistry::new(),
            plugin_roots: None,
            engine: None,
            cache: None,
            metrics: None,
            messenger: None,
            store: None,
            url_scanner: None,
            port_scanner: None,
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DescriptorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_url_scanner(mut self, scanner: Arc<dyn UrlScanner>) -> Self {
        self.url_scanner = Some(scanner);
        self
    }

    pub fn with_port_scanner(mut self, scanner: Arc<dyn PortScanner>) -> Self {
        self.port_scanner = Some(scanner);
        self
    }

    pub fn with_plugin_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.plugin_roots = Some(roots);
        self
    }

    /// 내장 확장 등록
    pub fn with_builtin(self, extension: Arc<dyn AppExtension>) -> Self {
        self.plugins.register_builtin(extension);
        self
    }

    pub fn build(self) -> Result<Arc<Runtime>> {
        let engine = self
            .engine
            .ok_or_else(|| Error::Config("No container engine configured".to_string()))?;

        let url_scanner: Arc<dyn UrlScanner> = match self.url_scanner {
            Some(scanner) => scanner,
            None => Arc::new(HttpUrlScanner::new(Duration::from_millis(
                self.config.scan_timeout_ms,
            ))?),
        };

        let config = self.config;
        Ok(Arc::new(Runtime {
            events: Arc::new(EventBus::new(HookScope::Process)),
            plugins: self.plugins,
            plugin_roots: self
                .plugin_roots
                .unwrap_or_else(|| vec![config.user_conf_root.clone()]),
            engine,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(FileCache::new(config.cache_dir()))),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(LogMetrics::new())),
            messenger: self
                .messenger
                .unwrap_or_else(|| Arc::new(StderrMessenger)),
            store: self.store.unwrap_or_else(|| Arc::new(YamlStore::new())),
            url_scanner,
            port_scanner: self
                .port_scanner
                .unwrap_or_else(|| Arc::new(TcpPortScanner::new())),
            config,
        }))
    }
}
