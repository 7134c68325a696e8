//! # Application
//!
//! 애플리케이션 라이프사이클 상태 머신
//!
//! ## 초기화 파이프라인 (`init`)
//!
//! ```text
//! 선언된 레이어 로드 ─▶ 플러그인 발견 ─▶ 확장 순차 로드/병합
//!        ─▶ pre-instantiate-app (process) ─▶ 추가된 fragment 반영 ─▶ 서비스 계산
//!        ─▶ globals fragment 앞에 삽입 ─▶ fragment별 파일 flatten
//!        ─▶ post-instantiate-app / post-init (app)
//! ```
//!
//! 모든 공개 작업은 `init`을 먼저 다시 실행합니다. `init`은 기본 설정에서
//! 매번 새로 조립하므로 같은 입력이면 같은 파일 집합을 만듭니다.

mod config;
mod info;
mod lifecycle;
mod naming;

pub use config::{AppConfig, APP_DESCRIPTOR_FILE};
pub use info::{seed_info, ServiceInfo, Warning, DEFAULT_SERVICE_TYPE};
pub use lifecycle::AppState;
pub use naming::{app_id, normalize_name, project_slug};

use crate::compose::{
    collect_services, declared_fragment_id, dump_fragments, globals_fragment, upsert_fragment,
    validate_files, ComposeFragment,
};
use crate::engine::EngineTarget;
use crate::plugin::{ExtensionData, PluginDescriptor};
use crate::runtime::Runtime;
use berth_foundation::{app_hooks, process_hooks, Error, EventBus, HookScope, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 애플리케이션
pub struct Application {
    name: String,
    project: String,
    id: String,
    descriptor_path: PathBuf,
    root: PathBuf,
    dir: PathBuf,
    base_config: AppConfig,
    /// 초기화 이후 추가된 fragment (재초기화 시 다시 반영)
    appended: Vec<ComposeFragment>,

    /// 플러그인 병합이 반영된 설정
    pub config: AppConfig,
    /// 순서가 있는 fragment 목록 (뒤가 우선)
    pub compose: Vec<ComposeFragment>,
    /// flatten된 디스크립터 파일
    pub files: Vec<PathBuf>,
    pub services: Vec<String>,
    pub info: Vec<ServiceInfo>,
    /// 살아있는 URL
    pub urls: Vec<String>,
    pub warnings: Vec<Warning>,
    pub env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,

    state: AppState,
    events: Arc<EventBus<Application>>,
    runtime: Arc<Runtime>,
}

impl Application {
    pub fn new(config: AppConfig, descriptor_path: impl Into<PathBuf>, runtime: Arc<Runtime>) -> Self {
        let descriptor_path = descriptor_path.into();
        let root = descriptor_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = normalize_name(&config.name);
        let project = project_slug(&config.name);
        let id = app_id(&name, &descriptor_path);
        let dir = runtime.config().compose_root().join(&project);

        Self {
            name,
            project,
            id,
            descriptor_path,
            root,
            dir,
            base_config: config.clone(),
            appended: Vec::new(),
            config,
            compose: Vec::new(),
            files: Vec::new(),
            services: Vec::new(),
            info: Vec::new(),
            urls: Vec::new(),
            warnings: Vec::new(),
            env: BTreeMap::new(),
            labels: BTreeMap::new(),
            state: AppState::Uninitialized,
            events: Arc::new(EventBus::new(HookScope::Application)),
            runtime,
        }
    }

    /// 디스크립터 파일에서 생성
    pub fn load(descriptor_path: impl Into<PathBuf>, runtime: Arc<Runtime>) -> Result<Self> {
        let descriptor_path = descriptor_path.into();
        let config = AppConfig::load(&descriptor_path)?;
        Ok(Self::new(config, descriptor_path, runtime))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }

    /// compose 파일 작업 디렉토리
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// 애플리케이션 범위 훅 버스
    pub fn events(&self) -> &Arc<EventBus<Application>> {
        &self.events
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// 엔진 작업 대상
    pub fn engine_target(&self) -> EngineTarget {
        EngineTarget::new(self.project.clone(), self.files.clone())
    }

    // ========================================================================
    // Init
    // ========================================================================

    /// 애플리케이션 초기화 (반복 실행 가능)
    pub async fn init(&mut self) -> Result<()> {
        let runtime = Arc::clone(&self.runtime);
        debug!(app = %self.name, root = %self.root.display(), "Initializing app");

        self.config = self.base_config.clone();
        self.env = self.default_env();
        self.labels = self.default_labels();
        self.compose.clear();

        // 선언된 레이어 (파일당 fragment 하나, 병합은 엔진이 담당)
        let layers = validate_files(&self.config.compose, &self.root);
        for (index, file) in layers.iter().enumerate() {
            match runtime.store().load(file) {
                Ok(data) => self
                    .compose
                    .push(ComposeFragment::new(declared_fragment_id(index), data)),
                Err(e) => warn!(app = %self.name, "Skipping compose layer: {}", e),
            }
        }

        // 플러그인 확장 (순차 로드 + 병합)
        let mut roots = runtime.plugin_roots().to_vec();
        roots.push(self.root.clone());
        let descriptors: Vec<PluginDescriptor> = runtime
            .plugins()
            .find(&roots)
            .filter(|d| d.has_app())
            .collect();

        for descriptor in &descriptors {
            match runtime.plugins().load(descriptor, self, &runtime).await {
                Ok(data) => self.merge_extension(data)?,
                Err(e @ (Error::PluginNotFound(_) | Error::Plugin(_))) => {
                    warn!(app = %self.name, plugin = %descriptor.name, "Skipping plugin extension: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        let global = Arc::clone(runtime.events());
        global
            .emit(process_hooks::PRE_INSTANTIATE_APP, self)
            .await?;

        // 조립
        for fragment in &self.appended {
            upsert_fragment(&mut self.compose, fragment.clone());
        }
        self.services = collect_services(&self.compose);
        let globals = globals_fragment(&self.services, &self.env, &self.labels);
        self.compose.insert(0, globals);
        self.files = dump_fragments(runtime.store(), &self.dir, &self.compose)?;

        debug!(app = %self.name, files = ?self.files, "App has compose files");
        info!(app = %self.name, "App is ready");

        if self.state == AppState::Uninitialized {
            self.state = AppState::Initialized;
        }

        self.emit(app_hooks::POST_INSTANTIATE_APP).await?;
        self.emit(app_hooks::POST_INIT).await
    }

    /// 확장 결과 병합
    ///
    /// 설정은 deep merge, fragment는 ID 단위 병합, env/labels는 키 단위 덮어쓰기.
    pub fn merge_extension(&mut self, data: ExtensionData) -> Result<()> {
        if let Some(config) = data.config {
            self.config.merge_value(config)?;
        }
        for fragment in data.compose_fragments {
            upsert_fragment(&mut self.compose, fragment);
        }
        self.env.extend(data.env);
        self.labels.extend(data.labels);
        Ok(())
    }

    /// 초기화 이후 fragment 추가
    ///
    /// 새 fragment 파일만 기록되고 기존 파일은 다시 쓰지 않습니다.
    /// 이후의 `init`에서도 같은 fragment가 유지됩니다.
    pub fn append_fragment(&mut self, fragment: ComposeFragment) -> Result<PathBuf> {
        let file = self
            .runtime
            .store()
            .dump(&fragment.file_path(&self.dir), &fragment.to_descriptor())?;

        self.appended.retain(|f| f.id != fragment.id);
        self.appended.push(fragment.clone());

        self.compose.retain(|f| f.id != fragment.id);
        self.compose.push(fragment);
        self.files.retain(|f| f != &file);
        self.files.push(file.clone());
        self.services = collect_services(&self.compose);

        Ok(file)
    }

    // ========================================================================
    // Hooks / side channels
    // ========================================================================

    /// 애플리케이션 버스에 훅 발행
    pub async fn emit(&mut self, hook: &str) -> Result<()> {
        let bus = Arc::clone(&self.events);
        bus.emit(hook, self).await
    }

    /// 진행 메시지. 실패는 로그만 남깁니다.
    pub fn message(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if let Err(e) = self.runtime.messenger().message(text) {
            warn!(app = %self.name, "Failed to deliver message: {}", e);
        }
        debug!(app = %self.name, "{}", text);
    }

    /// 텔레메트리 보고. 실패는 로그만 남깁니다.
    pub(crate) async fn report(&self, event: &str) {
        let metrics = Arc::clone(self.runtime.metrics());
        if let Err(e) = metrics.report(event, self.metrics_parse()).await {
            warn!(app = %self.name, event, "Failed to report metrics: {}", e);
        }
    }

    /// 텔레메트리 페이로드
    pub fn metrics_parse(&self) -> Value {
        json!({
            "app": self.id,
            "name": self.name,
            "type": DEFAULT_SERVICE_TYPE,
            "services": self.services,
        })
    }

    /// 서비스별 기본 정보 위에 기존 정보 얹기
    pub fn seed_info(&mut self) {
        let previous = std::mem::take(&mut self.info);
        self.info = seed_info(&self.services, previous);
    }

    pub fn info_for_mut(&mut self, service: &str) -> Option<&mut ServiceInfo> {
        self.info.iter_mut().find(|i| i.service == service)
    }

    fn default_env(&self) -> BTreeMap<String, String> {
        let mut env = self.runtime.config().app_env.clone();
        env.insert("BERTH_APP_NAME".into(), self.name.clone());
        env.insert("BERTH_APP_PROJECT".into(), self.project.clone());
        env
    }

    fn default_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.runtime.config().app_labels.clone();
        labels.insert("io.berth.container".into(), "TRUE".into());
        labels.insert("io.berth.app".into(), self.name.clone());
        labels
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("project", &self.project)
            .field("id", &self.id)
            .field("state", &self.state)
            .field("services", &self.services)
            .finish()
    }
}

#[cfg(test)]
mod tests;
